// mod.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

pub mod entity;
pub mod graph;
pub mod print;

pub use entity::{
    Entity, EntityIndex, EntityKind, IdLookup, Link, LinkId, NodeType, Pad, PadId, SubdevType,
};
pub use graph::{InvalidLink, Topology};
pub use print::{format_pad_state, read_pad_format, write_topology, PadFormat, TopologyFormat};

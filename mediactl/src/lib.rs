// lib.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! Media controller topology inspection and configuration.
//!
//! A [`MediaSession`] enumerates the entities, pads and links of a media
//! device into a [`Topology`], then applies link and pad format descriptors
//! written in the language described in [`parser`].

pub mod config;
pub mod device;
pub mod error;
pub mod parser;
pub mod session;
pub mod topology;

pub use config::SessionConfig;
#[cfg(target_os = "linux")]
pub use device::KernelDevice;
pub use device::{LinkFlags, MediaDevice, MemoryDevice, PadFlags};
pub use error::{MediaError, Result};
pub use parser::{DescriptorParser, LinkRequest, PadConfig, PixelCode};
pub use session::{MediaSession, PadConfigReport};
pub use topology::{Entity, EntityIndex, LinkId, PadId, Topology, TopologyFormat};

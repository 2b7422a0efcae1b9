// mod.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! Link and format descriptor language.
//!
//! ```text
//! pad         := entity-ref ':' pad-index
//! entity-ref  := '"' name '"' | entity-id
//! link        := pad '->' pad
//! link-cfg    := link '[' flags ']'
//! format      := pixelcode width 'x' height
//! crop        := '(' left ',' top ')' '/' width 'x' height
//! interval    := numerator '/' denominator
//! pad-cfg     := pad '[' [format] [crop] ['@' interval] ']'
//! link-list   := link-cfg (',' link-cfg)*
//! format-list := pad-cfg (',' pad-cfg)*
//! ```

mod cursor;
pub mod descriptor;
pub mod pixelcode;

pub use descriptor::{
    parse_formats, parse_link_setup, parse_links, parse_pad, parse_pad_config, DescriptorParser,
    EntityRef, FrameFormat, LinkRequest, PadConfig, Resolver, MAX_DESCRIPTOR_LENGTH,
};
pub use pixelcode::{PixelCode, UnknownPixelCode};


#[cfg(test)]
mod pixelcode_tests;

// types.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::ops::BitOr;
use std::path::PathBuf;

use serde::Serialize;

use super::entity_type;

/// Pad direction flags as reported by the device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PadFlags(u32);

impl PadFlags {
    pub const SINK: PadFlags = PadFlags(1 << 0);
    pub const SOURCE: PadFlags = PadFlags(1 << 1);
    pub const MUST_CONNECT: PadFlags = PadFlags(1 << 2);

    pub const fn from_bits(bits: u32) -> Self {
        PadFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: PadFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_sink(self) -> bool {
        self.contains(Self::SINK)
    }

    pub const fn is_source(self) -> bool {
        self.contains(Self::SOURCE)
    }
}

impl BitOr for PadFlags {
    type Output = PadFlags;

    fn bitor(self, rhs: PadFlags) -> PadFlags {
        PadFlags(self.0 | rhs.0)
    }
}

/// Link flags word
///
/// `IMMUTABLE` is fixed when the link is discovered; configuration requests
/// can never change it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LinkFlags(u32);

impl LinkFlags {
    pub const ENABLED: LinkFlags = LinkFlags(1 << 0);
    pub const IMMUTABLE: LinkFlags = LinkFlags(1 << 1);
    pub const DYNAMIC: LinkFlags = LinkFlags(1 << 2);

    pub const fn empty() -> Self {
        LinkFlags(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        LinkFlags(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: LinkFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_enabled(self) -> bool {
        self.contains(Self::ENABLED)
    }

    pub const fn is_immutable(self) -> bool {
        self.contains(Self::IMMUTABLE)
    }

    pub const fn without(self, other: LinkFlags) -> Self {
        LinkFlags(self.0 & !other.0)
    }

    /// Copy the `other` bits from `from`, keep every other bit of `self`.
    pub const fn with_bits_of(self, other: LinkFlags, from: LinkFlags) -> Self {
        LinkFlags((self.0 & !other.0) | (from.0 & other.0))
    }
}

impl BitOr for LinkFlags {
    type Output = LinkFlags;

    fn bitor(self, rhs: LinkFlags) -> LinkFlags {
        LinkFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for LinkFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.is_immutable() {
            names.push("IMMUTABLE");
        }
        if self.is_enabled() {
            names.push("ENABLED");
        }
        if self.contains(Self::DYNAMIC) {
            names.push("DYNAMIC");
        }
        write!(f, "{}", names.join(","))
    }
}

/// Media device identification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub driver: String,
    pub model: String,
    pub serial: String,
    pub bus_info: String,
    pub media_version: u32,
    pub hw_revision: u32,
    pub driver_version: u32,
}

impl DeviceInfo {
    /// Render a kernel `KERNEL_VERSION()` encoded number as `major.minor.patch`.
    pub fn version_string(version: u32) -> String {
        format!(
            "{}.{}.{}",
            (version >> 16) & 0xff,
            (version >> 8) & 0xff,
            version & 0xff
        )
    }
}

/// Character device number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DevNumber {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for DevNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.major, self.minor)
    }
}

/// One entity as reported by entity enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDescriptor {
    pub id: u32,
    pub name: String,
    /// Raw type word (type and subtype)
    pub entity_type: u32,
    pub revision: u32,
    pub flags: u32,
    pub group_id: u32,
    pub pads: u16,
    pub links: u16,
    pub dev: Option<DevNumber>,
    pub devnode: Option<PathBuf>,
}

impl EntityDescriptor {
    pub fn new(id: u32, name: impl Into<String>, entity_type: u32) -> Self {
        Self {
            id,
            name: name.into(),
            entity_type,
            revision: 0,
            flags: 0,
            group_id: 0,
            pads: 0,
            links: 0,
            dev: None,
            devnode: None,
        }
    }

    /// Whether the entity type carries a character device number.
    pub fn has_device_node(&self) -> bool {
        matches!(
            self.entity_type & entity_type::TYPE_MASK,
            entity_type::DEVNODE | entity_type::V4L2_SUBDEV
        )
    }
}

/// A pad as reported by link enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadDescriptor {
    /// Owning entity id
    pub entity: u32,
    pub index: u16,
    pub flags: PadFlags,
}

/// A link endpoint pair and its flags, as exchanged with the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDescriptor {
    pub source: PadDescriptor,
    pub sink: PadDescriptor,
    pub flags: LinkFlags,
}

/// Result of enumerating the pads and outbound links of one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinksEnum {
    pub pads: Vec<PadDescriptor>,
    pub links: Vec<LinkDescriptor>,
}

/// Selects the committed (`Active`) or negotiation-only (`Try`) value of a
/// subdev setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Which {
    Try = 0,
    Active = 1,
}

/// Media bus frame format of one pad
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MbusFrameFormat {
    pub width: u32,
    pub height: u32,
    pub code: u32,
    pub field: u32,
    pub colorspace: u32,
}

/// Rectangle in pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})/{}x{}",
            self.left, self.top, self.width, self.height
        )
    }
}

/// Frame interval in seconds, as a fraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Fraction {
    pub numerator: u32,
    pub denominator: u32,
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

// mod.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! Device collaborator contract.
//!
//! Everything the core needs from a media controller device goes through the
//! [`MediaDevice`] trait: entity and link enumeration, link setup, and the
//! per-pad format, crop and frame interval controls of subdevs. The kernel
//! transport lives in [`kernel`], an in-memory implementation in [`memory`].

#[cfg(target_os = "linux")]
pub mod devnode;
#[cfg(target_os = "linux")]
pub mod kernel;
pub mod memory;
pub mod types;

#[cfg(target_os = "linux")]
pub use kernel::KernelDevice;
pub use memory::{CallKind, DeviceCall, MemoryDevice};
pub use types::{
    DevNumber, DeviceInfo, EntityDescriptor, Fraction, LinkDescriptor, LinkFlags, LinksEnum,
    MbusFrameFormat, PadDescriptor, PadFlags, Rect, Which,
};

use std::path::Path;

use crate::error::Result;

/// Entity type field masks and values (legacy `MEDIA_ENT_T_*` encoding)
pub mod entity_type {
    pub const TYPE_SHIFT: u32 = 16;
    pub const TYPE_MASK: u32 = 0x00ff_0000;
    pub const SUBTYPE_MASK: u32 = 0x0000_ffff;

    pub const DEVNODE: u32 = 1 << TYPE_SHIFT;
    pub const DEVNODE_V4L: u32 = DEVNODE + 1;
    pub const DEVNODE_FB: u32 = DEVNODE + 2;
    pub const DEVNODE_ALSA: u32 = DEVNODE + 3;
    pub const DEVNODE_DVB: u32 = DEVNODE + 4;

    pub const V4L2_SUBDEV: u32 = 2 << TYPE_SHIFT;
    pub const V4L2_SUBDEV_SENSOR: u32 = V4L2_SUBDEV + 1;
    pub const V4L2_SUBDEV_FLASH: u32 = V4L2_SUBDEV + 2;
    pub const V4L2_SUBDEV_LENS: u32 = V4L2_SUBDEV + 3;
}

/// Identifies the subdev an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubdevRef<'a> {
    /// Device-assigned entity id
    pub id: u32,
    pub name: &'a str,
    /// Subdev device node, if one was resolved
    pub devnode: Option<&'a Path>,
}

/// Blocking access to one media controller device.
///
/// Every call runs to completion before returning. Failures are reported as
/// [`crate::MediaError::Device`] carrying the kernel errno; implementations
/// never retry.
pub trait MediaDevice {
    fn device_info(&mut self) -> Result<DeviceInfo>;

    /// All entities, in increasing id order.
    fn enumerate_entities(&mut self) -> Result<Vec<EntityDescriptor>>;

    /// Pads and outbound links of one entity.
    fn enumerate_links(&mut self, entity: &EntityDescriptor) -> Result<LinksEnum>;

    /// Apply link flags, returning the flags the device confirmed.
    fn setup_link(&mut self, link: &LinkDescriptor) -> Result<LinkFlags>;

    fn get_format(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        which: Which,
    ) -> Result<MbusFrameFormat>;

    /// Returns the format as adjusted by the device.
    fn set_format(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        format: &MbusFrameFormat,
        which: Which,
    ) -> Result<MbusFrameFormat>;

    fn get_crop(&mut self, subdev: SubdevRef<'_>, pad: u32, which: Which) -> Result<Rect>;

    fn set_crop(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        rect: &Rect,
        which: Which,
    ) -> Result<Rect>;

    fn get_frame_interval(&mut self, subdev: SubdevRef<'_>) -> Result<Fraction>;

    fn set_frame_interval(
        &mut self,
        subdev: SubdevRef<'_>,
        interval: &Fraction,
    ) -> Result<Fraction>;
}

#[cfg(test)]
mod memory_tests;

#[cfg(all(test, target_os = "linux"))]
mod devnode_tests;

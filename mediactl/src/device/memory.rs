// memory.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! In-memory media device.
//!
//! Models a device's entities, links and subdev state without a kernel. It
//! behaves like the media controller for the operations the core uses: link
//! enumeration only reports outbound links, setting the enabled bit of an
//! immutable link fails with `EINVAL`, and formats can be clamped to a
//! maximum size to model device adjustment. Every call is recorded in a log.

use std::collections::HashMap;
use std::path::PathBuf;

use super::types::{
    DeviceInfo, EntityDescriptor, Fraction, LinkDescriptor, LinkFlags, LinksEnum,
    MbusFrameFormat, PadDescriptor, PadFlags, Rect, Which,
};
use super::{entity_type, MediaDevice, SubdevRef};
use crate::error::{MediaError, Result};

/// A call received by a [`MemoryDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    DeviceInfo,
    EnumerateEntities,
    EnumerateLinks { entity: u32 },
    SetupLink { link: LinkDescriptor },
    GetFormat { entity: u32, pad: u32 },
    SetFormat { entity: u32, pad: u32, format: MbusFrameFormat },
    GetCrop { entity: u32, pad: u32 },
    SetCrop { entity: u32, pad: u32, rect: Rect },
    GetFrameInterval { entity: u32 },
    SetFrameInterval { entity: u32, interval: Fraction },
}

/// Call kinds that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    EnumerateEntities,
    EnumerateLinks,
    SetupLink,
    GetFormat,
    SetFormat,
    GetCrop,
    SetCrop,
    GetFrameInterval,
    SetFrameInterval,
}

#[derive(Debug, Clone)]
struct MemoryEntity {
    desc: EntityDescriptor,
    pads: Vec<PadFlags>,
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    code: i32,
    /// Restrict the failure to one entity id
    entity: Option<u32>,
}

#[derive(Debug, Default, Clone)]
pub struct MemoryDevice {
    info: DeviceInfo,
    entities: Vec<MemoryEntity>,
    links: Vec<LinkDescriptor>,
    formats: HashMap<(u32, u32), MbusFrameFormat>,
    crops: HashMap<(u32, u32), Rect>,
    intervals: HashMap<u32, Fraction>,
    max_size: Option<(u32, u32)>,
    failures: HashMap<CallKind, Failure>,
    calls: Vec<DeviceCall>,
}

impl MemoryDevice {
    pub fn new() -> Self {
        Self {
            info: DeviceInfo {
                driver: "memory".to_string(),
                model: "In-memory media device".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Add an entity with the next free id, returning that id.
    pub fn add_entity(&mut self, name: &str, entity_type: u32, pads: &[PadFlags]) -> u32 {
        let id = self
            .entities
            .iter()
            .map(|e| e.desc.id)
            .max()
            .map_or(1, |id| id + 1);
        self.add_entity_with_id(id, name, entity_type, pads)
    }

    pub fn add_entity_with_id(
        &mut self,
        id: u32,
        name: &str,
        entity_type: u32,
        pads: &[PadFlags],
    ) -> u32 {
        let mut desc = EntityDescriptor::new(id, name, entity_type);
        desc.pads = pads.len() as u16;
        if desc.has_device_node() {
            desc.devnode = Some(PathBuf::from(format!("/dev/memory-entity{}", id)));
        }
        self.entities.push(MemoryEntity {
            desc,
            pads: pads.to_vec(),
        });
        id
    }

    /// Add a link between `(entity id, pad index)` endpoints. Endpoints are
    /// not validated, so links to missing entities can be modelled.
    pub fn add_link(&mut self, source: (u32, u16), sink: (u32, u16), flags: LinkFlags) {
        let link = LinkDescriptor {
            source: PadDescriptor {
                entity: source.0,
                index: source.1,
                flags: PadFlags::SOURCE,
            },
            sink: PadDescriptor {
                entity: sink.0,
                index: sink.1,
                flags: PadFlags::SINK,
            },
            flags,
        };
        if let Some(entity) = self.entities.iter_mut().find(|e| e.desc.id == source.0) {
            entity.desc.links += 1;
        }
        self.links.push(link);
    }

    pub fn set_device_info(&mut self, info: DeviceInfo) {
        self.info = info;
    }

    /// Clamp every format set on the device to at most `width`x`height`.
    pub fn set_max_size(&mut self, width: u32, height: u32) {
        self.max_size = Some((width, height));
    }

    /// Make every call of `kind` fail with `code`.
    pub fn fail(&mut self, kind: CallKind, code: i32) {
        self.failures.insert(kind, Failure { code, entity: None });
    }

    /// Make calls of `kind` targeting entity `entity` fail with `code`.
    pub fn fail_for_entity(&mut self, kind: CallKind, entity: u32, code: i32) {
        self.failures.insert(
            kind,
            Failure {
                code,
                entity: Some(entity),
            },
        );
    }

    pub fn clear_failures(&mut self) {
        self.failures.clear();
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Current flags of the link between two endpoints.
    pub fn link_flags(&self, source: (u32, u16), sink: (u32, u16)) -> Option<LinkFlags> {
        self.find_link(source, sink).map(|i| self.links[i].flags)
    }

    pub fn format(&self, entity: u32, pad: u32) -> Option<MbusFrameFormat> {
        self.formats.get(&(entity, pad)).copied()
    }

    pub fn crop(&self, entity: u32, pad: u32) -> Option<Rect> {
        self.crops.get(&(entity, pad)).copied()
    }

    pub fn frame_interval(&self, entity: u32) -> Option<Fraction> {
        self.intervals.get(&entity).copied()
    }

    fn find_link(&self, source: (u32, u16), sink: (u32, u16)) -> Option<usize> {
        self.links.iter().position(|l| {
            l.source.entity == source.0
                && l.source.index == source.1
                && l.sink.entity == sink.0
                && l.sink.index == sink.1
        })
    }

    fn check(&self, kind: CallKind, entity: Option<u32>, context: &str) -> Result<()> {
        match self.failures.get(&kind) {
            Some(failure) if failure.entity.is_none() || failure.entity == entity => {
                Err(MediaError::Device {
                    context: context.to_string(),
                    code: failure.code,
                })
            }
            _ => Ok(()),
        }
    }

    fn subdev_entity(&self, subdev: SubdevRef<'_>, pad: Option<u32>) -> Result<&MemoryEntity> {
        let entity = self
            .entities
            .iter()
            .find(|e| e.desc.id == subdev.id)
            .ok_or_else(|| MediaError::NotFound(format!("entity {}", subdev.id)))?;

        if entity.desc.entity_type & entity_type::TYPE_MASK != entity_type::V4L2_SUBDEV {
            return Err(MediaError::Device {
                context: format!("Entity '{}' is not a subdev", entity.desc.name),
                code: libc::ENOTTY,
            });
        }

        if let Some(pad) = pad {
            if pad as usize >= entity.pads.len() {
                return Err(MediaError::Device {
                    context: format!("Entity '{}' has no pad {}", entity.desc.name, pad),
                    code: libc::EINVAL,
                });
            }
        }

        Ok(entity)
    }

    fn clamp(&self, mut format: MbusFrameFormat) -> MbusFrameFormat {
        if let Some((width, height)) = self.max_size {
            format.width = format.width.min(width);
            format.height = format.height.min(height);
        }
        format
    }
}

impl MediaDevice for MemoryDevice {
    fn device_info(&mut self) -> Result<DeviceInfo> {
        self.calls.push(DeviceCall::DeviceInfo);
        Ok(self.info.clone())
    }

    fn enumerate_entities(&mut self) -> Result<Vec<EntityDescriptor>> {
        self.calls.push(DeviceCall::EnumerateEntities);
        self.check(
            CallKind::EnumerateEntities,
            None,
            "Unable to enumerate entities",
        )?;

        let mut entities: Vec<EntityDescriptor> =
            self.entities.iter().map(|e| e.desc.clone()).collect();
        entities.sort_by_key(|e| e.id);
        Ok(entities)
    }

    fn enumerate_links(&mut self, entity: &EntityDescriptor) -> Result<LinksEnum> {
        self.calls.push(DeviceCall::EnumerateLinks { entity: entity.id });
        self.check(
            CallKind::EnumerateLinks,
            Some(entity.id),
            "Unable to enumerate pads and links",
        )?;

        let pads = self
            .entities
            .iter()
            .find(|e| e.desc.id == entity.id)
            .map(|e| {
                e.pads
                    .iter()
                    .enumerate()
                    .map(|(index, flags)| PadDescriptor {
                        entity: entity.id,
                        index: index as u16,
                        flags: *flags,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let links = self
            .links
            .iter()
            .filter(|l| l.source.entity == entity.id)
            .copied()
            .collect();

        Ok(LinksEnum { pads, links })
    }

    fn setup_link(&mut self, link: &LinkDescriptor) -> Result<LinkFlags> {
        self.calls.push(DeviceCall::SetupLink { link: *link });
        self.check(
            CallKind::SetupLink,
            Some(link.source.entity),
            "Unable to setup link",
        )?;

        let index = self
            .find_link(
                (link.source.entity, link.source.index),
                (link.sink.entity, link.sink.index),
            )
            .ok_or_else(|| MediaError::Device {
                context: "Unable to setup link".to_string(),
                code: libc::EINVAL,
            })?;

        let current = self.links[index].flags;
        if current.is_immutable() && current.is_enabled() != link.flags.is_enabled() {
            return Err(MediaError::Device {
                context: "Unable to setup link".to_string(),
                code: libc::EINVAL,
            });
        }

        // Only the enabled bit is writable
        let flags = current.with_bits_of(LinkFlags::ENABLED, link.flags);
        self.links[index].flags = flags;
        Ok(flags)
    }

    fn get_format(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        _which: Which,
    ) -> Result<MbusFrameFormat> {
        self.calls.push(DeviceCall::GetFormat {
            entity: subdev.id,
            pad,
        });
        self.check(CallKind::GetFormat, Some(subdev.id), "Unable to get format")?;
        self.subdev_entity(subdev, Some(pad))?;

        Ok(self.format(subdev.id, pad).unwrap_or_default())
    }

    fn set_format(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        format: &MbusFrameFormat,
        _which: Which,
    ) -> Result<MbusFrameFormat> {
        self.calls.push(DeviceCall::SetFormat {
            entity: subdev.id,
            pad,
            format: *format,
        });
        self.check(CallKind::SetFormat, Some(subdev.id), "Unable to set format")?;
        self.subdev_entity(subdev, Some(pad))?;

        let applied = self.clamp(*format);
        self.formats.insert((subdev.id, pad), applied);
        Ok(applied)
    }

    fn get_crop(&mut self, subdev: SubdevRef<'_>, pad: u32, _which: Which) -> Result<Rect> {
        self.calls.push(DeviceCall::GetCrop {
            entity: subdev.id,
            pad,
        });
        self.check(
            CallKind::GetCrop,
            Some(subdev.id),
            "Unable to get crop rectangle",
        )?;
        self.subdev_entity(subdev, Some(pad))?;

        self.crop(subdev.id, pad).ok_or_else(|| MediaError::Device {
            context: "Unable to get crop rectangle".to_string(),
            code: libc::EINVAL,
        })
    }

    fn set_crop(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        rect: &Rect,
        _which: Which,
    ) -> Result<Rect> {
        self.calls.push(DeviceCall::SetCrop {
            entity: subdev.id,
            pad,
            rect: *rect,
        });
        self.check(
            CallKind::SetCrop,
            Some(subdev.id),
            "Unable to set crop rectangle",
        )?;
        self.subdev_entity(subdev, Some(pad))?;

        self.crops.insert((subdev.id, pad), *rect);
        Ok(*rect)
    }

    fn get_frame_interval(&mut self, subdev: SubdevRef<'_>) -> Result<Fraction> {
        self.calls.push(DeviceCall::GetFrameInterval { entity: subdev.id });
        self.check(
            CallKind::GetFrameInterval,
            Some(subdev.id),
            "Unable to get frame interval",
        )?;
        self.subdev_entity(subdev, None)?;

        Ok(self.frame_interval(subdev.id).unwrap_or_default())
    }

    fn set_frame_interval(
        &mut self,
        subdev: SubdevRef<'_>,
        interval: &Fraction,
    ) -> Result<Fraction> {
        self.calls.push(DeviceCall::SetFrameInterval {
            entity: subdev.id,
            interval: *interval,
        });
        self.check(
            CallKind::SetFrameInterval,
            Some(subdev.id),
            "Unable to set frame interval",
        )?;
        self.subdev_entity(subdev, None)?;

        self.intervals.insert(subdev.id, *interval);
        Ok(*interval)
    }
}

// graph.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use tracing::{debug, info, warn};

use super::entity::{Entity, EntityIndex, IdLookup, Link, LinkId, Pad, PadId};
use crate::device::{EntityDescriptor, LinkDescriptor, LinkFlags, MediaDevice, PadDescriptor};
use crate::error::{MediaError, Result};
use crate::parser::{EntityRef, Resolver};

/// A link reported by the device that could not be inserted into the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLink {
    pub source: PadDescriptor,
    pub sink: PadDescriptor,
    pub flags: LinkFlags,
    pub reason: String,
}

/// In-memory media graph of one device.
///
/// Entities live in an arena; pads and links refer to each other by
/// [`EntityIndex`], pad index and link slot, so growing a link list never
/// invalidates a reference held elsewhere. Every physical link is stored
/// twice, in its source entity's list and in its sink entity's list, and the
/// two copies always carry the same flags.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    entities: Vec<Entity>,
    invalid_links: Vec<InvalidLink>,
}

impl Topology {
    /// Build the graph from the device: entities first, then the outbound
    /// links of every entity.
    pub fn enumerate<D: MediaDevice + ?Sized>(device: &mut D) -> Result<Self> {
        let descriptors = device.enumerate_entities()?;

        let mut topology = Topology::default();
        topology
            .entities
            .try_reserve(descriptors.len())
            .map_err(|_| MediaError::OutOfMemory)?;

        for desc in &descriptors {
            topology.add_entity(desc)?;
        }

        for (index, desc) in descriptors.iter().enumerate() {
            let links = device.enumerate_links(desc)?;

            let entity = &mut topology.entities[index];
            for pad in &links.pads {
                match entity.pads.get_mut(pad.index as usize) {
                    Some(slot) => slot.flags = pad.flags,
                    None => warn!(
                        "Entity '{}' reported pad {} beyond its {} pads",
                        desc.name,
                        pad.index,
                        entity.pads.len()
                    ),
                }
            }

            for link in &links.links {
                topology.add_link(link)?;
            }
        }

        info!(
            "Enumerated {} entities, {} links ({} invalid)",
            topology.entities.len(),
            topology.links().count(),
            topology.invalid_links.len()
        );

        Ok(topology)
    }

    fn add_entity(&mut self, desc: &EntityDescriptor) -> Result<()> {
        let index = EntityIndex(self.entities.len());
        let mut entity = Entity::from_descriptor(index, desc);

        // Every outbound link needs a slot, and potentially every pad an
        // inbound one.
        entity
            .links
            .try_reserve(desc.pads as usize + desc.links as usize)
            .map_err(|_| MediaError::OutOfMemory)?;

        debug!(
            "Found entity '{}' (id {}, type {:#010x}, {} pads, {} links)",
            desc.name, desc.id, desc.entity_type, desc.pads, desc.links
        );

        self.entities.push(entity);
        Ok(())
    }

    fn add_link(&mut self, desc: &LinkDescriptor) -> Result<()> {
        let source = match self.resolve_descriptor_pad(&desc.source) {
            Ok(pad) => pad,
            Err(reason) => return self.reject_link(desc, reason),
        };
        let sink = match self.resolve_descriptor_pad(&desc.sink) {
            Ok(pad) => pad,
            Err(reason) => return self.reject_link(desc, reason),
        };

        let source_slot = self.entities[source.entity.0].links.len();
        let sink_slot = if source.entity == sink.entity {
            source_slot + 1
        } else {
            self.entities[sink.entity.0].links.len()
        };

        let source_id = LinkId {
            entity: source.entity,
            slot: source_slot,
        };
        let sink_id = LinkId {
            entity: sink.entity,
            slot: sink_slot,
        };

        self.push_link(
            source.entity,
            Link {
                source,
                sink,
                flags: desc.flags,
                twin: sink_id,
            },
        )?;
        self.push_link(
            sink.entity,
            Link {
                source,
                sink,
                flags: desc.flags,
                twin: source_id,
            },
        )?;

        debug!(
            "Found link {} -> {} [{}]",
            self.describe_pad(source),
            self.describe_pad(sink),
            desc.flags
        );

        Ok(())
    }

    fn push_link(&mut self, entity: EntityIndex, link: Link) -> Result<()> {
        let links = &mut self.entities[entity.0].links;
        links.try_reserve(1).map_err(|_| MediaError::OutOfMemory)?;
        links.push(link);
        Ok(())
    }

    fn resolve_descriptor_pad(&self, pad: &PadDescriptor) -> std::result::Result<PadId, String> {
        let entity = self
            .find_entity_by_id(pad.entity, IdLookup::Exact)
            .ok_or_else(|| format!("no entity with id {}", pad.entity))?;

        if pad.index as usize >= self.entities[entity.0].pads.len() {
            return Err(format!(
                "entity '{}' has no pad {}",
                self.entities[entity.0].name(),
                pad.index
            ));
        }

        Ok(PadId {
            entity,
            index: pad.index,
        })
    }

    fn reject_link(&mut self, desc: &LinkDescriptor, reason: String) -> Result<()> {
        warn!(
            "Ignoring invalid link {}:{} -> {}:{}: {}",
            desc.source.entity, desc.source.index, desc.sink.entity, desc.sink.index, reason
        );

        self.invalid_links
            .try_reserve(1)
            .map_err(|_| MediaError::OutOfMemory)?;
        self.invalid_links.push(InvalidLink {
            source: desc.source,
            sink: desc.sink,
            flags: desc.flags,
            reason,
        });
        Ok(())
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, index: EntityIndex) -> &Entity {
        &self.entities[index.0]
    }

    /// Find an entity by exact name.
    ///
    /// Entity names are not guaranteed unique. When several entities share a
    /// name the first one in enumeration order is returned, which callers
    /// must not rely on.
    pub fn find_entity_by_name(&self, name: &str) -> Option<EntityIndex> {
        self.entities
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.index())
    }

    pub fn find_entity_by_id(&self, id: u32, lookup: IdLookup) -> Option<EntityIndex> {
        let entity = match lookup {
            IdLookup::Exact => self.entities.iter().find(|e| e.id() == id),
            IdLookup::Next => self
                .entities
                .iter()
                .filter(|e| e.id() > id)
                .min_by_key(|e| e.id()),
        };
        entity.map(|e| e.index())
    }

    pub fn pad(&self, pad: PadId) -> &Pad {
        &self.entities[pad.entity.0].pads[pad.index as usize]
    }

    pub fn link(&self, link: LinkId) -> &Link {
        &self.entities[link.entity.0].links[link.slot]
    }

    /// The source-side copy of the link from `source` to `sink`.
    pub fn find_link(&self, source: PadId, sink: PadId) -> Option<LinkId> {
        self.entities[source.entity.0]
            .links
            .iter()
            .position(|l| l.source == source && l.sink == sink)
            .map(|slot| LinkId {
                entity: source.entity,
                slot,
            })
    }

    /// Source pad of the enabled link ending at `sink`, if `sink` is a sink
    /// pad and such a link exists.
    pub fn remote_source(&self, sink: PadId) -> Option<PadId> {
        if !self.pad(sink).flags.is_sink() {
            return None;
        }

        self.entities[sink.entity.0]
            .links
            .iter()
            .find(|l| l.flags.is_enabled() && l.sink == sink)
            .map(|l| l.source)
    }

    /// Every physical link once, through its source-side copy.
    pub fn links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.entities.iter().flat_map(|entity| entity.outbound_links())
    }

    pub fn invalid_links(&self) -> &[InvalidLink] {
        &self.invalid_links
    }

    /// Store confirmed flags on a link and its twin.
    pub(crate) fn set_link_flags(&mut self, link: LinkId, flags: LinkFlags) {
        let twin = self.link(link).twin;
        self.entities[link.entity.0].links[link.slot].flags = flags;
        self.entities[twin.entity.0].links[twin.slot].flags = flags;
    }

    /// Render a pad in descriptor syntax, e.g. `"Sensor":0`.
    pub fn describe_pad(&self, pad: PadId) -> String {
        format!("\"{}\":{}", self.entity(pad.entity).name(), pad.index)
    }

    /// Render a link and its flags in descriptor syntax, e.g.
    /// `"Sensor":0 -> "Processor":0 [1]`.
    pub fn describe_link(&self, link: LinkId) -> String {
        let link = self.link(link);
        format!(
            "{} -> {} [{}]",
            self.describe_pad(link.source),
            self.describe_pad(link.sink),
            link.flags.bits()
        )
    }
}

impl Resolver for Topology {
    fn resolve_pad(&self, entity: EntityRef<'_>, index: u32) -> Result<PadId> {
        let found = match entity {
            EntityRef::Name(name) => self.find_entity_by_name(name),
            EntityRef::Id(id) => self.find_entity_by_id(id, IdLookup::Exact),
        }
        .ok_or_else(|| MediaError::NotFound(format!("entity {}", entity)))?;

        let entity = self.entity(found);
        if index >= entity.pads().len() as u32 {
            return Err(MediaError::NotFound(format!(
                "pad {} of entity '{}'",
                index,
                entity.name()
            )));
        }

        Ok(PadId {
            entity: found,
            index: index as u16,
        })
    }

    fn resolve_link(&self, source: PadId, sink: PadId) -> Result<LinkId> {
        self.find_link(source, sink).ok_or_else(|| {
            MediaError::NotFound(format!(
                "link {} -> {}",
                self.describe_pad(source),
                self.describe_pad(sink)
            ))
        })
    }
}

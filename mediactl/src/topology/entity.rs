// entity.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::path::{Path, PathBuf};

use crate::device::{entity_type, DevNumber, EntityDescriptor, LinkFlags, PadFlags, SubdevRef};

/// Position of an entity in the topology arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIndex(pub(crate) usize);

impl EntityIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A pad, addressed by its owning entity and its index within that entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PadId {
    pub entity: EntityIndex,
    pub index: u16,
}

/// One stored copy of a link: the entity whose link list holds it, and its
/// slot in that list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId {
    pub entity: EntityIndex,
    pub slot: usize,
}

/// Entity lookup mode for [`crate::Topology::find_entity_by_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdLookup {
    /// The entity with exactly this id
    Exact,
    /// The entity with the smallest id strictly greater than the query
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    V4l,
    Fb,
    Alsa,
    Dvb,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubdevType {
    Sensor,
    Flash,
    Lens,
    Unknown,
}

/// What an entity is, with the data that only makes sense for that kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    DeviceNode {
        node_type: NodeType,
        devnode: Option<PathBuf>,
    },
    Subdev {
        subdev_type: SubdevType,
        devnode: Option<PathBuf>,
    },
    Unknown {
        entity_type: u32,
    },
}

impl EntityKind {
    pub fn from_descriptor(desc: &EntityDescriptor) -> Self {
        let subtype = desc.entity_type & entity_type::SUBTYPE_MASK;
        let devnode = desc.devnode.clone();

        match desc.entity_type & entity_type::TYPE_MASK {
            entity_type::DEVNODE => EntityKind::DeviceNode {
                node_type: match subtype {
                    1 => NodeType::V4l,
                    2 => NodeType::Fb,
                    3 => NodeType::Alsa,
                    4 => NodeType::Dvb,
                    _ => NodeType::Unknown,
                },
                devnode,
            },
            entity_type::V4L2_SUBDEV => EntityKind::Subdev {
                subdev_type: match subtype {
                    1 => SubdevType::Sensor,
                    2 => SubdevType::Flash,
                    3 => SubdevType::Lens,
                    _ => SubdevType::Unknown,
                },
                devnode,
            },
            _ => EntityKind::Unknown {
                entity_type: desc.entity_type,
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            EntityKind::DeviceNode { .. } => "Node",
            EntityKind::Subdev { .. } => "V4L2 subdev",
            EntityKind::Unknown { .. } => "Unknown",
        }
    }

    pub fn subtype_name(&self) -> &'static str {
        match self {
            EntityKind::DeviceNode { node_type, .. } => match node_type {
                NodeType::V4l => "V4L",
                NodeType::Fb => "FB",
                NodeType::Alsa => "ALSA",
                NodeType::Dvb => "DVB",
                NodeType::Unknown => "Unknown",
            },
            EntityKind::Subdev { subdev_type, .. } => match subdev_type {
                SubdevType::Sensor => "Sensor",
                SubdevType::Flash => "Flash",
                SubdevType::Lens => "Lens",
                SubdevType::Unknown => "Unknown",
            },
            EntityKind::Unknown { .. } => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pad {
    pub entity: EntityIndex,
    pub index: u16,
    pub flags: PadFlags,
}

impl Pad {
    pub fn id(&self) -> PadId {
        PadId {
            entity: self.entity,
            index: self.index,
        }
    }

    pub fn direction(&self) -> &'static str {
        if self.flags.is_sink() {
            "Input"
        } else if self.flags.is_source() {
            "Output"
        } else {
            "Unknown"
        }
    }
}

/// One copy of a physical link. The other copy is `twin`, stored in the link
/// list of the entity at the opposite end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub source: PadId,
    pub sink: PadId,
    pub flags: LinkFlags,
    pub twin: LinkId,
}

impl Link {
    /// Whether the copy stored at `id` is the source-side one.
    ///
    /// Both copies of a self-loop live in the same entity. The one stored
    /// first is the source side.
    pub fn is_source_copy(&self, id: LinkId) -> bool {
        self.source.entity == id.entity
            && (self.sink.entity != id.entity || id.slot < self.twin.slot)
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    index: EntityIndex,
    id: u32,
    name: String,
    entity_type: u32,
    revision: u32,
    group_id: u32,
    dev: Option<DevNumber>,
    kind: EntityKind,
    pub(crate) pads: Vec<Pad>,
    pub(crate) links: Vec<Link>,
}

impl Entity {
    pub(crate) fn from_descriptor(index: EntityIndex, desc: &EntityDescriptor) -> Self {
        let pads = (0..desc.pads)
            .map(|i| Pad {
                entity: index,
                index: i,
                flags: PadFlags::default(),
            })
            .collect();

        Self {
            index,
            id: desc.id,
            name: desc.name.clone(),
            entity_type: desc.entity_type,
            revision: desc.revision,
            group_id: desc.group_id,
            dev: desc.dev,
            kind: EntityKind::from_descriptor(desc),
            pads,
            links: Vec::new(),
        }
    }

    pub fn index(&self) -> EntityIndex {
        self.index
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw type word as reported by the device
    pub fn entity_type(&self) -> u32 {
        self.entity_type
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn dev(&self) -> Option<DevNumber> {
        self.dev
    }

    pub fn kind(&self) -> &EntityKind {
        &self.kind
    }

    pub fn is_subdev(&self) -> bool {
        matches!(self.kind, EntityKind::Subdev { .. })
    }

    pub fn devnode(&self) -> Option<&Path> {
        match &self.kind {
            EntityKind::DeviceNode { devnode, .. } | EntityKind::Subdev { devnode, .. } => {
                devnode.as_deref()
            }
            EntityKind::Unknown { .. } => None,
        }
    }

    pub fn pads(&self) -> &[Pad] {
        &self.pads
    }

    pub fn pad(&self, index: u16) -> Option<&Pad> {
        self.pads.get(index as usize)
    }

    /// Every link touching this entity, inbound and outbound.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Links stored in this entity, each with the id of its copy.
    pub fn link_ids(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        let entity = self.index;
        self.links
            .iter()
            .enumerate()
            .map(move |(slot, link)| (LinkId { entity, slot }, link))
    }

    /// Source-side copies of the links stored in this entity.
    pub fn outbound_links(&self) -> impl Iterator<Item = (LinkId, &Link)> + '_ {
        self.link_ids().filter(|(id, link)| link.is_source_copy(*id))
    }

    /// Handle used to address this entity's subdev controls.
    pub fn subdev_ref(&self) -> SubdevRef<'_> {
        SubdevRef {
            id: self.id,
            name: &self.name,
            devnode: self.devnode(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({})", self.name, self.id)
    }
}

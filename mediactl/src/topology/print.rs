// print.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! Topology rendering: human readable text, a graphviz dot graph, and a
//! JSON snapshot.

use std::fmt;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::entity::{Entity, EntityKind, Link, Pad, PadId};
use super::graph::Topology;
use crate::device::{LinkFlags, MbusFrameFormat, MediaDevice, PadFlags, Rect, Which};
use crate::error::Result;
use crate::parser::pixelcode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyFormat {
    Text,
    Dot,
    Json,
}

pub fn write_topology(
    out: &mut dyn Write,
    topology: &Topology,
    device: &mut dyn MediaDevice,
    format: TopologyFormat,
) -> Result<()> {
    match format {
        TopologyFormat::Text => write_text(out, topology, device),
        TopologyFormat::Dot => write_dot(out, topology),
        TopologyFormat::Json => write_json(out, topology, device),
    }
}

/// Active format of a pad, with its crop rectangle when the device has one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadFormat {
    pub format: MbusFrameFormat,
    pub crop: Option<Rect>,
}

impl fmt::Display for PadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} {}x{}",
            pixelcode::code_name(self.format.code),
            self.format.width,
            self.format.height
        )?;
        if let Some(crop) = self.crop {
            write!(f, " {}", crop)?;
        }
        write!(f, "]")
    }
}

/// Read the active format and crop rectangle of a pad.
///
/// Only the format is required; a crop rectangle the device refuses to
/// report is left out.
pub fn read_pad_format(
    topology: &Topology,
    device: &mut dyn MediaDevice,
    pad: PadId,
) -> Result<PadFormat> {
    let subdev = topology.entity(pad.entity).subdev_ref();
    let index = u32::from(pad.index);

    let format = device.get_format(subdev, index, Which::Active)?;
    let crop = device.get_crop(subdev, index, Which::Active).ok();
    Ok(PadFormat { format, crop })
}

/// Active state of a pad rendered as `[CODE WxH (l,t)/WxH]`, or `None` when
/// the format cannot be read.
pub fn format_pad_state(
    topology: &Topology,
    device: &mut dyn MediaDevice,
    pad: PadId,
) -> Option<String> {
    read_pad_format(topology, device, pad)
        .ok()
        .map(|state| state.to_string())
}

fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}

fn link_state(flags: LinkFlags) -> String {
    let mut names = Vec::new();
    if flags.is_immutable() {
        names.push("IMMUTABLE");
    }
    if flags.is_enabled() {
        names.push("ACTIVE");
    }
    names.join(",")
}

fn write_text(
    out: &mut dyn Write,
    topology: &Topology,
    device: &mut dyn MediaDevice,
) -> Result<()> {
    writeln!(out, "Device topology")?;

    for entity in topology.entities() {
        let header = format!("- entity {}: ", entity.id());
        let padding = " ".repeat(header.len());
        let pads = entity.pads().len();
        let links = entity.links().len();

        writeln!(
            out,
            "{}{} ({} pad{}, {} link{})",
            header,
            entity.name(),
            pads,
            plural(pads),
            links,
            plural(links)
        )?;
        writeln!(
            out,
            "{}type {} subtype {}",
            padding,
            entity.kind().type_name(),
            entity.kind().subtype_name()
        )?;
        if let Some(devnode) = entity.devnode() {
            writeln!(out, "{}device node name {}", padding, devnode.display())?;
        }

        for pad in entity.pads() {
            write!(out, "\tpad{}: {}", pad.index, pad.direction())?;
            if entity.is_subdev() {
                if let Some(state) = format_pad_state(topology, device, pad.id()) {
                    write!(out, " {}", state)?;
                }
            }
            writeln!(out)?;

            for (id, link) in entity.link_ids() {
                let outbound = link.is_source_copy(id);
                if outbound && link.source == pad.id() {
                    write!(
                        out,
                        "\t\t-> '{}':pad{}",
                        topology.entity(link.sink.entity).name(),
                        link.sink.index
                    )?;
                } else if !outbound && link.sink == pad.id() {
                    write!(
                        out,
                        "\t\t<- '{}':pad{}",
                        topology.entity(link.source.entity).name(),
                        link.source.index
                    )?;
                } else {
                    continue;
                }
                writeln!(out, " [{}]", link_state(link.flags))?;
            }
        }
        writeln!(out)?;
    }

    Ok(())
}

fn dot_ports(entity: &Entity, direction: PadFlags) -> String {
    entity
        .pads()
        .iter()
        .filter(|p| p.flags.contains(direction))
        .map(|p| format!("<port{}> {}", p.index, p.index))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn dot_endpoint(topology: &Topology, pad: PadId) -> String {
    let entity = topology.entity(pad.entity);
    if entity.is_subdev() {
        format!("n{:08x}:port{}", entity.id(), pad.index)
    } else {
        format!("n{:08x}", entity.id())
    }
}

fn write_dot(out: &mut dyn Write, topology: &Topology) -> Result<()> {
    writeln!(out, "digraph board {{")?;
    writeln!(out, "\trankdir=TB")?;

    for entity in topology.entities() {
        let devnode = entity
            .devnode()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        match entity.kind() {
            EntityKind::DeviceNode { .. } => writeln!(
                out,
                "\tn{:08x} [label=\"{}\\n{}\", shape=box, style=filled, fillcolor=yellow]",
                entity.id(),
                entity.name(),
                devnode
            )?,
            EntityKind::Subdev { .. } => {
                let mut label = format!(
                    "{{{{{}}} | {}",
                    dot_ports(entity, PadFlags::SINK),
                    entity.name()
                );
                if !devnode.is_empty() {
                    label.push_str(&format!("\\n{}", devnode));
                }
                label.push_str(&format!(" | {{{}}}}}", dot_ports(entity, PadFlags::SOURCE)));
                writeln!(
                    out,
                    "\tn{:08x} [label=\"{}\", shape=Mrecord, style=filled, fillcolor=green]",
                    entity.id(),
                    label
                )?;
            }
            EntityKind::Unknown { .. } => continue,
        }

        for (_, link) in entity.outbound_links() {
            write!(
                out,
                "\t{} -> {}",
                dot_endpoint(topology, link.source),
                dot_endpoint(topology, link.sink)
            )?;
            if link.flags.is_immutable() {
                write!(out, " [style=bold]")?;
            } else if !link.flags.is_enabled() {
                write!(out, " [style=dashed]")?;
            }
            writeln!(out)?;
        }
    }

    writeln!(out, "}}")?;
    Ok(())
}

#[derive(Serialize)]
struct TopologySnapshot<'a> {
    entities: Vec<EntitySnapshot<'a>>,
    invalid_links: usize,
}

#[derive(Serialize)]
struct EntitySnapshot<'a> {
    id: u32,
    name: &'a str,
    #[serde(rename = "type")]
    type_name: &'static str,
    subtype: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    devnode: Option<&'a Path>,
    pads: Vec<PadSnapshot>,
    links: Vec<LinkSnapshot<'a>>,
}

#[derive(Serialize)]
struct PadSnapshot {
    index: u16,
    direction: &'static str,
    flags: PadFlags,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<FormatSnapshot>,
}

#[derive(Serialize)]
struct FormatSnapshot {
    code: &'static str,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    crop: Option<Rect>,
}

#[derive(Serialize)]
struct EndpointSnapshot<'a> {
    entity: &'a str,
    id: u32,
    pad: u16,
}

#[derive(Serialize)]
struct LinkSnapshot<'a> {
    source: EndpointSnapshot<'a>,
    sink: EndpointSnapshot<'a>,
    flags: LinkFlags,
    enabled: bool,
    immutable: bool,
}

fn endpoint_snapshot(topology: &Topology, pad: PadId) -> EndpointSnapshot<'_> {
    let entity = topology.entity(pad.entity);
    EndpointSnapshot {
        entity: entity.name(),
        id: entity.id(),
        pad: pad.index,
    }
}

fn pad_snapshot(
    topology: &Topology,
    device: &mut dyn MediaDevice,
    entity: &Entity,
    pad: &Pad,
) -> PadSnapshot {
    let format = if entity.is_subdev() {
        read_pad_format(topology, device, pad.id())
            .ok()
            .map(|state| FormatSnapshot {
                code: pixelcode::code_name(state.format.code),
                width: state.format.width,
                height: state.format.height,
                crop: state.crop,
            })
    } else {
        None
    };

    PadSnapshot {
        index: pad.index,
        direction: pad.direction(),
        flags: pad.flags,
        format,
    }
}

fn link_snapshot<'a>(topology: &'a Topology, link: &Link) -> LinkSnapshot<'a> {
    LinkSnapshot {
        source: endpoint_snapshot(topology, link.source),
        sink: endpoint_snapshot(topology, link.sink),
        flags: link.flags,
        enabled: link.flags.is_enabled(),
        immutable: link.flags.is_immutable(),
    }
}

fn write_json(
    out: &mut dyn Write,
    topology: &Topology,
    device: &mut dyn MediaDevice,
) -> Result<()> {
    let mut entities = Vec::with_capacity(topology.entities().len());

    for entity in topology.entities() {
        let pads = entity
            .pads()
            .iter()
            .map(|pad| pad_snapshot(topology, device, entity, pad))
            .collect();
        let links = entity
            .outbound_links()
            .map(|(_, l)| link_snapshot(topology, l))
            .collect();

        entities.push(EntitySnapshot {
            id: entity.id(),
            name: entity.name(),
            type_name: entity.kind().type_name(),
            subtype: entity.kind().subtype_name(),
            devnode: entity.devnode(),
            pads,
            links,
        });
    }

    let snapshot = TopologySnapshot {
        entities,
        invalid_links: topology.invalid_links().len(),
    };

    serde_json::to_writer_pretty(&mut *out, &snapshot).map_err(std::io::Error::from)?;
    writeln!(out)?;
    Ok(())
}

// link.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use tracing::{debug, info};

use super::MediaSession;
use crate::device::{LinkDescriptor, LinkFlags, MediaDevice, PadDescriptor, PadFlags};
use crate::error::{MediaError, Result};
use crate::parser::{DescriptorParser, LinkRequest};
use crate::topology::PadId;

impl<D: MediaDevice> MediaSession<D> {
    /// Apply `flags` to the link from `source` to `sink`, returning the flags
    /// the device confirmed.
    ///
    /// The immutable bit always comes from the existing link, and an
    /// immutable link keeps its enabled bit: requests to change either are
    /// normalized without error. On success both copies of the link store
    /// the confirmed flags; on failure the graph is left untouched.
    pub fn configure_link(
        &mut self,
        source: PadId,
        sink: PadId,
        flags: LinkFlags,
    ) -> Result<LinkFlags> {
        let id = self.topology.find_link(source, sink).ok_or_else(|| {
            MediaError::NotFound(format!(
                "link {} -> {}",
                self.topology.describe_pad(source),
                self.topology.describe_pad(sink)
            ))
        })?;

        let current = self.topology.link(id).flags;
        let fixed = if current.is_immutable() {
            LinkFlags::IMMUTABLE | LinkFlags::ENABLED
        } else {
            LinkFlags::IMMUTABLE
        };
        let effective = flags.with_bits_of(fixed, current);
        if effective != flags {
            debug!(
                "Keeping fixed flags of link {} -> {}: requested [{}], using [{}]",
                self.topology.describe_pad(source),
                self.topology.describe_pad(sink),
                flags.bits(),
                effective.bits()
            );
        }

        let source_entity = self.topology.entity(source.entity);
        let sink_entity = self.topology.entity(sink.entity);
        let desc = LinkDescriptor {
            source: PadDescriptor {
                entity: source_entity.id(),
                index: source.index,
                flags: PadFlags::SOURCE,
            },
            sink: PadDescriptor {
                entity: sink_entity.id(),
                index: sink.index,
                flags: PadFlags::SINK,
            },
            flags: effective,
        };

        info!(
            "Setting up link {}:{} -> {}:{} [{}]",
            desc.source.entity,
            desc.source.index,
            desc.sink.entity,
            desc.sink.index,
            effective.bits()
        );

        let confirmed = self.device.setup_link(&desc)?;
        self.topology.set_link_flags(id, confirmed);

        Ok(confirmed)
    }

    /// Apply one parsed link descriptor.
    pub fn apply_link(&mut self, request: &LinkRequest) -> Result<LinkFlags> {
        self.configure_link(request.source, request.sink, request.flags)
    }

    /// Disable every link that is not immutable, visiting each physical link
    /// once from its source side. Stops at the first failure. Returns the
    /// number of links reset.
    pub fn reset_all_links(&mut self) -> Result<usize> {
        info!("Resetting all links to inactive");

        let targets: Vec<(PadId, PadId, LinkFlags)> = self
            .topology
            .links()
            .filter(|(_, link)| !link.flags.is_immutable())
            .map(|(_, link)| (link.source, link.sink, link.flags))
            .collect();

        for (source, sink, flags) in &targets {
            self.configure_link(*source, *sink, flags.without(LinkFlags::ENABLED))?;
        }

        Ok(targets.len())
    }

    /// Parse and apply a `link-list`, element by element.
    ///
    /// Elements applied before a failure stay applied. Returns the number of
    /// links configured.
    pub fn setup_links(&mut self, descriptors: &str) -> Result<usize> {
        let mut parser = DescriptorParser::new(descriptors)?;
        parser.each_item(|p| {
            let request = p.link_setup(&self.topology)?;
            self.apply_link(&request)?;
            Ok(())
        })
    }
}

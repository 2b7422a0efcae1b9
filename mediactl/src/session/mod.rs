// mod.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! A media device together with its enumerated topology.
//!
//! The session owns the device for its whole lifetime and keeps the graph in
//! step with what the device confirmed. Link configuration lives in
//! [`link`], pad format configuration in [`format`].

pub mod format;
pub mod link;

pub use format::PadConfigReport;

use std::io::Write;
use std::path::Path;

use tracing::{debug, info};

use crate::config::SessionConfig;
#[cfg(target_os = "linux")]
use crate::device::KernelDevice;
use crate::device::{DeviceInfo, MediaDevice};
use crate::error::{MediaError, Result};
use crate::parser::parse_pad;
use crate::topology::{
    read_pad_format, write_topology, PadFormat, PadId, Topology, TopologyFormat,
};

pub struct MediaSession<D: MediaDevice> {
    device: D,
    topology: Topology,
    config: SessionConfig,
}

#[cfg(target_os = "linux")]
impl MediaSession<KernelDevice> {
    /// Open the configured media device node and enumerate its topology.
    pub fn open(config: SessionConfig) -> Result<Self> {
        info!("Opening media device '{}'", config.device.display());
        let device = KernelDevice::open(&config)?;
        Self::new(device, config)
    }
}

impl<D: MediaDevice> MediaSession<D> {
    /// Enumerate the device topology. Any device failure during enumeration
    /// fails the whole session.
    pub fn new(mut device: D, config: SessionConfig) -> Result<Self> {
        let topology = Topology::enumerate(&mut device)?;
        debug!(
            "Session ready on '{}' with {} entities",
            config.device.display(),
            topology.entities().len()
        );

        Ok(Self {
            device,
            topology,
            config,
        })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn device_info(&mut self) -> Result<DeviceInfo> {
        self.device.device_info()
    }

    /// Device node of the entity named `name`, `None` if it has none.
    pub fn entity_devnode(&self, name: &str) -> Result<Option<&Path>> {
        let entity = self
            .topology
            .find_entity_by_name(name)
            .ok_or_else(|| MediaError::NotFound(format!("entity '{}'", name)))?;
        Ok(self.topology.entity(entity).devnode())
    }

    /// Resolve a single pad descriptor such as `"Sensor":0`.
    pub fn parse_pad(&self, descriptor: &str) -> Result<PadId> {
        parse_pad(descriptor, &self.topology)
    }

    /// Active format and crop rectangle of a pad.
    pub fn pad_format(&mut self, pad: PadId) -> Result<PadFormat> {
        read_pad_format(&self.topology, &mut self.device, pad)
    }

    pub fn write_topology(&mut self, out: &mut dyn Write, format: TopologyFormat) -> Result<()> {
        write_topology(out, &self.topology, &mut self.device, format)
    }
}


#[cfg(test)]
mod format_tests;

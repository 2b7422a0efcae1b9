// format.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use tracing::{info, warn};

use super::MediaSession;
use crate::device::{Fraction, MbusFrameFormat, MediaDevice, Rect, Which};
use crate::error::{MediaError, Result};
use crate::parser::{pixelcode, DescriptorParser, FrameFormat, PadConfig};
use crate::topology::{EntityIndex, PadId};

/// What one pad configuration actually applied
#[derive(Debug, Default)]
pub struct PadConfigReport {
    /// Crop rectangle as confirmed by the device
    pub crop: Option<Rect>,
    /// Format as adjusted by the device
    pub format: Option<MbusFrameFormat>,
    pub interval: Option<Fraction>,
    /// Downstream sink pads that received the requested format
    pub propagated: Vec<(PadId, MbusFrameFormat)>,
    /// Downstream sink pads where propagation failed
    pub propagation_errors: Vec<(PadId, MediaError)>,
}

impl<D: MediaDevice> MediaSession<D> {
    /// Apply a pad configuration.
    ///
    /// Settings are applied in order: crop on a source pad, format, crop on
    /// a sink pad, then the frame interval of the owning entity. A format
    /// with a zero dimension and an interval with a zero numerator are
    /// skipped. When a format was applied to a source pad, the requested
    /// format is also set on every sink subdev pad reached through an
    /// enabled link; those failures are reported but do not fail the call.
    pub fn configure_pad(&mut self, config: &PadConfig) -> Result<PadConfigReport> {
        let pad = config.pad;
        let flags = self.topology.pad(pad).flags;
        let mut report = PadConfigReport::default();

        if flags.is_source() {
            if let Some(crop) = &config.crop {
                report.crop = Some(self.set_crop(pad, crop)?);
            }
        }

        let format = config.format.filter(|f| !f.is_empty());
        if let Some(format) = &format {
            report.format = Some(self.set_format(pad, format)?);
        }

        if flags.is_sink() {
            if let Some(crop) = &config.crop {
                report.crop = Some(self.set_crop(pad, crop)?);
            }
        }

        if let Some(interval) = config.interval.filter(|i| i.numerator != 0) {
            report.interval = Some(self.set_frame_interval(pad.entity, &interval)?);
        }

        if flags.is_source() {
            if let Some(format) = &format {
                self.propagate_format(pad, format, &mut report);
            }
        }

        Ok(report)
    }

    fn propagate_format(&mut self, pad: PadId, format: &FrameFormat, report: &mut PadConfigReport) {
        let sinks: Vec<PadId> = self
            .topology
            .entity(pad.entity)
            .outbound_links()
            .map(|(_, link)| link)
            .filter(|link| {
                link.source == pad
                    && link.flags.is_enabled()
                    && self.topology.entity(link.sink.entity).is_subdev()
            })
            .map(|link| link.sink)
            .collect();

        for sink in sinks {
            match self.set_format(sink, format) {
                Ok(applied) => report.propagated.push((sink, applied)),
                Err(e) => {
                    warn!(
                        "Unable to propagate format to {}: {}",
                        self.topology.describe_pad(sink),
                        e
                    );
                    report.propagation_errors.push((sink, e));
                }
            }
        }
    }

    fn set_format(&mut self, pad: PadId, format: &FrameFormat) -> Result<MbusFrameFormat> {
        let entity = self.topology.entity(pad.entity);

        info!(
            "Setting up format {} on pad {}/{}",
            format,
            entity.name(),
            pad.index
        );

        let applied = self.device.set_format(
            entity.subdev_ref(),
            u32::from(pad.index),
            &format.to_mbus(),
            Which::Active,
        )?;

        info!(
            "Format set: {} {}x{}",
            pixelcode::code_name(applied.code),
            applied.width,
            applied.height
        );

        Ok(applied)
    }

    fn set_crop(&mut self, pad: PadId, crop: &Rect) -> Result<Rect> {
        let entity = self.topology.entity(pad.entity);

        info!(
            "Setting up crop rectangle {} on pad {}/{}",
            crop,
            entity.name(),
            pad.index
        );

        let applied = self.device.set_crop(
            entity.subdev_ref(),
            u32::from(pad.index),
            crop,
            Which::Active,
        )?;

        info!("Crop rectangle set: {}", applied);
        Ok(applied)
    }

    fn set_frame_interval(&mut self, entity: EntityIndex, interval: &Fraction) -> Result<Fraction> {
        let entity = self.topology.entity(entity);

        info!(
            "Setting up frame interval {} on entity {}",
            interval,
            entity.name()
        );

        let applied = self
            .device
            .set_frame_interval(entity.subdev_ref(), interval)?;

        info!("Frame interval set: {}", applied);
        Ok(applied)
    }

    /// Parse and apply a `format-list`, element by element.
    ///
    /// Elements applied before a failure stay applied.
    pub fn setup_formats(&mut self, descriptors: &str) -> Result<Vec<PadConfigReport>> {
        let mut parser = DescriptorParser::new(descriptors)?;
        let mut reports = Vec::new();
        parser.each_item(|p| {
            let config = p.pad_config(&self.topology)?;
            reports.push(self.configure_pad(&config)?);
            Ok(())
        })?;
        Ok(reports)
    }
}

// format_tests.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use super::*;
use crate::device::{
    entity_type, CallKind, DeviceCall, Fraction, LinkFlags, MbusFrameFormat, MemoryDevice,
    PadFlags, Rect,
};
use crate::error::MediaError;
use crate::parser::{FrameFormat, PadConfig, PixelCode};

const SENSOR: u32 = 1;
const ISP: u32 = 2;
const VIDEO: u32 = 3;

/// Sensor:0 -> ISP:0 with the given flags, Sensor:0 -> video:0 enabled
fn session(sensor_isp: LinkFlags) -> MediaSession<MemoryDevice> {
    let mut device = MemoryDevice::new();
    device.add_entity_with_id(
        SENSOR,
        "Sensor",
        entity_type::V4L2_SUBDEV_SENSOR,
        &[PadFlags::SOURCE],
    );
    device.add_entity_with_id(
        ISP,
        "ISP",
        entity_type::V4L2_SUBDEV,
        &[PadFlags::SINK, PadFlags::SOURCE],
    );
    device.add_entity_with_id(VIDEO, "video", entity_type::DEVNODE_V4L, &[PadFlags::SINK]);
    device.add_link((SENSOR, 0), (ISP, 0), sensor_isp);
    device.add_link((SENSOR, 0), (VIDEO, 0), LinkFlags::ENABLED);

    let mut session = MediaSession::new(device, SessionConfig::default()).unwrap();
    session.device_mut().clear_calls();
    session
}

fn pad(session: &MediaSession<MemoryDevice>, name: &str, index: u16) -> PadId {
    PadId {
        entity: session.topology().find_entity_by_name(name).unwrap(),
        index,
    }
}

fn uyvy(width: u32, height: u32) -> FrameFormat {
    FrameFormat {
        code: PixelCode::Uyvy,
        width,
        height,
    }
}

fn config(pad: PadId) -> PadConfig {
    PadConfig {
        pad,
        format: None,
        crop: None,
        interval: None,
    }
}

#[test]
fn test_format_propagates_over_enabled_link() {
    let mut session = session(LinkFlags::ENABLED);
    let sensor = pad(&session, "Sensor", 0);
    let isp = pad(&session, "ISP", 0);

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(640, 480)),
            ..config(sensor)
        })
        .unwrap();

    let expected = uyvy(640, 480).to_mbus();
    assert_eq!(report.format, Some(expected));
    assert_eq!(report.propagated, vec![(isp, expected)]);
    assert!(report.propagation_errors.is_empty());
    assert_eq!(session.device().format(ISP, 0), Some(expected));
    // Device nodes never receive a propagated format
    assert_eq!(session.device().format(VIDEO, 0), None);
}

#[test]
fn test_format_not_propagated_over_disabled_link() {
    let mut session = session(LinkFlags::empty());
    let sensor = pad(&session, "Sensor", 0);

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(640, 480)),
            ..config(sensor)
        })
        .unwrap();

    assert!(report.propagated.is_empty());
    assert_eq!(session.device().format(ISP, 0), None);
    assert!(!session
        .device()
        .calls()
        .iter()
        .any(|c| matches!(c, DeviceCall::SetFormat { entity: ISP, .. })));
}

#[test]
fn test_propagation_uses_requested_format() {
    let mut session = session(LinkFlags::ENABLED);
    session.device_mut().set_max_size(320, 240);
    let sensor = pad(&session, "Sensor", 0);

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(640, 480)),
            ..config(sensor)
        })
        .unwrap();

    // The device adjusted the sensor format, but the request is what
    // travels downstream.
    assert_eq!(report.format.map(|f| f.width), Some(320));
    let requested = session
        .device()
        .calls()
        .iter()
        .find_map(|c| match c {
            DeviceCall::SetFormat {
                entity: ISP,
                format,
                ..
            } => Some(*format),
            _ => None,
        })
        .unwrap();
    assert_eq!(requested.width, 640);
    assert_eq!(requested.height, 480);
}

#[test]
fn test_propagation_failure_is_reported() {
    let mut session = session(LinkFlags::ENABLED);
    session
        .device_mut()
        .fail_for_entity(CallKind::SetFormat, ISP, libc::EINVAL);
    let sensor = pad(&session, "Sensor", 0);
    let isp = pad(&session, "ISP", 0);

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(640, 480)),
            ..config(sensor)
        })
        .unwrap();

    assert!(report.format.is_some());
    assert_eq!(report.propagation_errors.len(), 1);
    assert_eq!(report.propagation_errors[0].0, isp);
    assert_eq!(report.propagation_errors[0].1.errno(), Some(libc::EINVAL));
}

#[test]
fn test_apply_order_on_source_pad() {
    let mut session = session(LinkFlags::empty());
    let sensor = pad(&session, "Sensor", 0);
    let crop = Rect {
        left: 0,
        top: 0,
        width: 1920,
        height: 1080,
    };
    let interval = Fraction {
        numerator: 1,
        denominator: 30,
    };

    session
        .configure_pad(&PadConfig {
            pad: sensor,
            format: Some(uyvy(1920, 1080)),
            crop: Some(crop),
            interval: Some(interval),
        })
        .unwrap();

    let calls = session.device().calls();
    assert_eq!(calls.len(), 3);
    assert!(matches!(calls[0], DeviceCall::SetCrop { entity: SENSOR, pad: 0, .. }));
    assert!(matches!(calls[1], DeviceCall::SetFormat { entity: SENSOR, pad: 0, .. }));
    assert_eq!(
        calls[2],
        DeviceCall::SetFrameInterval {
            entity: SENSOR,
            interval,
        }
    );
}

#[test]
fn test_apply_order_on_sink_pad() {
    let mut session = session(LinkFlags::empty());
    let isp = pad(&session, "ISP", 0);
    let crop = Rect {
        left: 16,
        top: 8,
        width: 608,
        height: 464,
    };

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(640, 480)),
            crop: Some(crop),
            ..config(isp)
        })
        .unwrap();

    let calls = session.device().calls();
    assert!(matches!(calls[0], DeviceCall::SetFormat { entity: ISP, pad: 0, .. }));
    assert!(matches!(calls[1], DeviceCall::SetCrop { entity: ISP, pad: 0, .. }));
    assert_eq!(report.crop, Some(crop));
    assert!(report.propagated.is_empty());
}

#[test]
fn test_unset_fields_are_skipped() {
    let mut session = session(LinkFlags::ENABLED);
    let sensor = pad(&session, "Sensor", 0);

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(0, 480)),
            interval: Some(Fraction {
                numerator: 0,
                denominator: 30,
            }),
            ..config(sensor)
        })
        .unwrap();

    assert!(session.device().calls().is_empty());
    assert!(report.format.is_none());
    assert!(report.interval.is_none());
}

#[test]
fn test_format_error_aborts_pad_config() {
    let mut session = session(LinkFlags::ENABLED);
    session.device_mut().fail(CallKind::SetFormat, libc::EPIPE);
    let sensor = pad(&session, "Sensor", 0);

    let err = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(640, 480)),
            interval: Some(Fraction {
                numerator: 1,
                denominator: 30,
            }),
            ..config(sensor)
        })
        .unwrap_err();

    assert_eq!(err.errno(), Some(libc::EPIPE));
    assert!(!session
        .device()
        .calls()
        .iter()
        .any(|c| matches!(c, DeviceCall::SetFrameInterval { .. })));
}

#[test]
fn test_setup_formats() {
    let mut session = session(LinkFlags::ENABLED);

    let reports = session
        .setup_formats(
            "\"Sensor\":0[SGRBG10 1280x720 (0,0)/1280x720 @1/60], \
             \"ISP\":1[YUYV 1280x720]",
        )
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(
        session.device().format(SENSOR, 0),
        Some(MbusFrameFormat {
            width: 1280,
            height: 720,
            code: PixelCode::Sgrbg10.code(),
            ..Default::default()
        })
    );
    assert_eq!(session.device().format(ISP, 0).map(|f| f.code), Some(0x300a));
    assert_eq!(session.device().format(ISP, 1).map(|f| f.code), Some(0x2011));
    assert_eq!(
        session.device().frame_interval(SENSOR),
        Some(Fraction {
            numerator: 1,
            denominator: 60,
        })
    );
}

#[test]
fn test_setup_formats_stops_at_failure() {
    let mut session = session(LinkFlags::ENABLED);

    let err = session
        .setup_formats("\"Sensor\":0[UYVY 640x480], \"ISP\":0[BOGUS 1x1], \"ISP\":1[UYVY 640x480]")
        .unwrap_err();

    assert!(matches!(err, MediaError::Batch { index: 1, .. }));
    assert!(session.device().format(SENSOR, 0).is_some());
    assert!(session.device().format(ISP, 1).is_none());
}

#[test]
fn test_self_loop_propagates_once() {
    let mut device = MemoryDevice::new();
    let id = device.add_entity(
        "Loop",
        entity_type::V4L2_SUBDEV,
        &[PadFlags::SINK, PadFlags::SOURCE],
    );
    device.add_link((id, 1), (id, 0), LinkFlags::ENABLED);
    let mut session = MediaSession::new(device, SessionConfig::default()).unwrap();
    let source = pad(&session, "Loop", 1);
    let sink = pad(&session, "Loop", 0);

    let report = session
        .configure_pad(&PadConfig {
            format: Some(uyvy(320, 240)),
            ..config(source)
        })
        .unwrap();

    assert_eq!(report.propagated.len(), 1);
    assert_eq!(report.propagated[0].0, sink);
}

// memory_tests.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use super::memory::*;
use super::*;
use crate::error::MediaError;

fn sensor_pipeline() -> (MemoryDevice, u32, u32) {
    let mut device = MemoryDevice::new();
    let sensor = device.add_entity(
        "Sensor",
        entity_type::V4L2_SUBDEV_SENSOR,
        &[PadFlags::SOURCE],
    );
    let isp = device.add_entity(
        "ISP",
        entity_type::V4L2_SUBDEV,
        &[PadFlags::SINK, PadFlags::SOURCE],
    );
    device.add_link((sensor, 0), (isp, 0), LinkFlags::empty());
    (device, sensor, isp)
}

fn subdev(id: u32) -> SubdevRef<'static> {
    SubdevRef {
        id,
        name: "test",
        devnode: None,
    }
}

#[test]
fn test_add_entity_assigns_sequential_ids() {
    let (device, sensor, isp) = sensor_pipeline();

    assert_eq!(sensor, 1);
    assert_eq!(isp, 2);
    assert!(device.calls().is_empty());
}

#[test]
fn test_enumerate_entities_sorted_by_id() {
    let mut device = MemoryDevice::new();
    device.add_entity_with_id(7, "Late", entity_type::V4L2_SUBDEV, &[]);
    device.add_entity_with_id(3, "Early", entity_type::DEVNODE_V4L, &[PadFlags::SINK]);

    let entities = device.enumerate_entities().unwrap();
    let ids: Vec<u32> = entities.iter().map(|e| e.id).collect();

    assert_eq!(ids, vec![3, 7]);
    assert!(entities[0].devnode.is_some());
    assert_eq!(entities[0].pads, 1);
}

#[test]
fn test_enumerate_links_reports_outbound_only() {
    let (mut device, sensor, isp) = sensor_pipeline();
    let entities = device.enumerate_entities().unwrap();

    let sensor_links = device.enumerate_links(&entities[0]).unwrap();
    assert_eq!(sensor_links.pads.len(), 1);
    assert_eq!(sensor_links.links.len(), 1);
    assert_eq!(sensor_links.links[0].source.entity, sensor);
    assert_eq!(sensor_links.links[0].sink.entity, isp);

    let isp_links = device.enumerate_links(&entities[1]).unwrap();
    assert_eq!(isp_links.pads.len(), 2);
    assert!(isp_links.links.is_empty());
}

#[test]
fn test_setup_link_enables() {
    let (mut device, sensor, isp) = sensor_pipeline();
    let link = LinkDescriptor {
        source: PadDescriptor {
            entity: sensor,
            index: 0,
            flags: PadFlags::SOURCE,
        },
        sink: PadDescriptor {
            entity: isp,
            index: 0,
            flags: PadFlags::SINK,
        },
        flags: LinkFlags::ENABLED,
    };

    let flags = device.setup_link(&link).unwrap();

    assert!(flags.is_enabled());
    assert_eq!(device.link_flags((sensor, 0), (isp, 0)), Some(LinkFlags::ENABLED));
    assert_eq!(device.calls(), &[DeviceCall::SetupLink { link }]);
}

#[test]
fn test_setup_link_immutable_cannot_be_disabled() {
    let mut device = MemoryDevice::new();
    let a = device.add_entity("A", entity_type::V4L2_SUBDEV, &[PadFlags::SOURCE]);
    let b = device.add_entity("B", entity_type::V4L2_SUBDEV, &[PadFlags::SINK]);
    let fixed = LinkFlags::ENABLED | LinkFlags::IMMUTABLE;
    device.add_link((a, 0), (b, 0), fixed);

    let link = LinkDescriptor {
        source: PadDescriptor {
            entity: a,
            index: 0,
            flags: PadFlags::SOURCE,
        },
        sink: PadDescriptor {
            entity: b,
            index: 0,
            flags: PadFlags::SINK,
        },
        flags: LinkFlags::IMMUTABLE,
    };

    let err = device.setup_link(&link).unwrap_err();
    assert_eq!(err.errno(), Some(libc::EINVAL));
    assert_eq!(device.link_flags((a, 0), (b, 0)), Some(fixed));
}

#[test]
fn test_setup_link_unknown_link() {
    let (mut device, sensor, _) = sensor_pipeline();
    let link = LinkDescriptor {
        source: PadDescriptor {
            entity: sensor,
            index: 0,
            flags: PadFlags::SOURCE,
        },
        sink: PadDescriptor {
            entity: 42,
            index: 0,
            flags: PadFlags::SINK,
        },
        flags: LinkFlags::ENABLED,
    };

    assert!(matches!(
        device.setup_link(&link),
        Err(MediaError::Device { code, .. }) if code == libc::EINVAL
    ));
}

#[test]
fn test_set_format_clamps_to_max_size() {
    let (mut device, sensor, _) = sensor_pipeline();
    device.set_max_size(1280, 720);

    let requested = MbusFrameFormat {
        width: 1920,
        height: 1080,
        code: 0x200f,
        ..Default::default()
    };
    let applied = device
        .set_format(subdev(sensor), 0, &requested, Which::Active)
        .unwrap();

    assert_eq!(applied.width, 1280);
    assert_eq!(applied.height, 720);
    assert_eq!(applied.code, 0x200f);
    assert_eq!(device.format(sensor, 0), Some(applied));
    assert_eq!(
        device.get_format(subdev(sensor), 0, Which::Active).unwrap(),
        applied
    );
}

#[test]
fn test_set_format_rejects_missing_pad() {
    let (mut device, sensor, _) = sensor_pipeline();

    let err = device
        .set_format(subdev(sensor), 3, &MbusFrameFormat::default(), Which::Active)
        .unwrap_err();

    assert_eq!(err.errno(), Some(libc::EINVAL));
}

#[test]
fn test_subdev_calls_reject_device_nodes() {
    let mut device = MemoryDevice::new();
    let node = device.add_entity("video0", entity_type::DEVNODE_V4L, &[PadFlags::SINK]);

    let err = device
        .get_format(subdev(node), 0, Which::Active)
        .unwrap_err();

    assert_eq!(err.errno(), Some(libc::ENOTTY));
}

#[test]
fn test_crop_and_interval_are_stored() {
    let (mut device, sensor, isp) = sensor_pipeline();
    let rect = Rect {
        left: 8,
        top: 4,
        width: 640,
        height: 480,
    };
    let interval = Fraction {
        numerator: 1,
        denominator: 30,
    };

    device.set_crop(subdev(isp), 0, &rect, Which::Active).unwrap();
    device.set_frame_interval(subdev(sensor), &interval).unwrap();

    assert_eq!(device.get_crop(subdev(isp), 0, Which::Active).unwrap(), rect);
    assert_eq!(device.get_frame_interval(subdev(sensor)).unwrap(), interval);
    assert!(device.get_crop(subdev(isp), 1, Which::Active).is_err());
}

#[test]
fn test_injected_failure_for_entity() {
    let (mut device, sensor, isp) = sensor_pipeline();
    device.fail_for_entity(CallKind::SetFormat, isp, libc::EBUSY);

    let format = MbusFrameFormat {
        width: 640,
        height: 480,
        ..Default::default()
    };
    assert!(device
        .set_format(subdev(sensor), 0, &format, Which::Active)
        .is_ok());

    let err = device
        .set_format(subdev(isp), 0, &format, Which::Active)
        .unwrap_err();
    assert_eq!(err.errno(), Some(libc::EBUSY));
    assert!(err.to_string().starts_with("Unable to set format"));

    device.clear_failures();
    assert!(device
        .set_format(subdev(isp), 0, &format, Which::Active)
        .is_ok());
}

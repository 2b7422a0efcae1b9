// session_integration.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! End-to-end tests of a session over an in-memory device.

use mediactl::device::{entity_type, DeviceCall};
use mediactl::{LinkFlags, MediaError, MediaSession, MemoryDevice, PadFlags, PadId, SessionConfig};
use proptest::prelude::*;

const SENSOR: u32 = 1;
const CCDC: u32 = 2;
const PREVIEW: u32 = 3;
const OUTPUT: u32 = 4;

/// sensor -> ccdc -> preview -> output, plus an immutable ccdc -> output
/// path and a mutable sensor -> preview bypass.
fn pipeline() -> MemoryDevice {
    let mut device = MemoryDevice::new();
    device.add_entity_with_id(
        SENSOR,
        "mt9p031 2-0048",
        entity_type::V4L2_SUBDEV_SENSOR,
        &[PadFlags::SOURCE],
    );
    device.add_entity_with_id(
        CCDC,
        "OMAP3 ISP CCDC",
        entity_type::V4L2_SUBDEV,
        &[PadFlags::SINK, PadFlags::SOURCE, PadFlags::SOURCE],
    );
    device.add_entity_with_id(
        PREVIEW,
        "OMAP3 ISP preview",
        entity_type::V4L2_SUBDEV,
        &[PadFlags::SINK, PadFlags::SOURCE],
    );
    device.add_entity_with_id(
        OUTPUT,
        "OMAP3 ISP preview output",
        entity_type::DEVNODE_V4L,
        &[PadFlags::SINK],
    );

    device.add_link((SENSOR, 0), (CCDC, 0), LinkFlags::ENABLED);
    device.add_link((CCDC, 2), (PREVIEW, 0), LinkFlags::empty());
    device.add_link((PREVIEW, 1), (OUTPUT, 0), LinkFlags::empty());
    device.add_link(
        (CCDC, 1),
        (OUTPUT, 0),
        LinkFlags::ENABLED | LinkFlags::IMMUTABLE,
    );
    device.add_link((SENSOR, 0), (PREVIEW, 0), LinkFlags::empty());
    device
}

fn session() -> MediaSession<MemoryDevice> {
    MediaSession::new(pipeline(), SessionConfig::default()).unwrap()
}

fn all_links(session: &MediaSession<MemoryDevice>) -> Vec<(PadId, PadId, bool)> {
    session
        .topology()
        .links()
        .map(|(_, link)| (link.source, link.sink, link.flags.is_immutable()))
        .collect()
}

fn assert_twins_agree(session: &MediaSession<MemoryDevice>) {
    let topology = session.topology();
    for entity in topology.entities() {
        for (id, link) in entity.link_ids() {
            let twin = topology.link(link.twin);
            assert_ne!(link.twin, id);
            assert_eq!(twin.twin, id);
            assert_eq!(link.flags, twin.flags);
            assert_eq!(link.source, twin.source);
            assert_eq!(link.sink, twin.sink);
        }
    }
}

proptest! {
    #[test]
    fn test_immutable_bit_is_preserved(bits in any::<u32>(), pick in 0usize..5) {
        let mut session = session();
        let links = all_links(&session);
        let (source, sink, immutable) = links[pick % links.len()];

        let confirmed = session
            .configure_link(source, sink, LinkFlags::from_bits(bits))
            .unwrap();

        prop_assert_eq!(confirmed.is_immutable(), immutable);
        if immutable {
            prop_assert!(confirmed.is_enabled());
        } else {
            prop_assert_eq!(confirmed.is_enabled(), LinkFlags::from_bits(bits).is_enabled());
        }
    }

    #[test]
    fn test_twin_flags_stay_symmetric(
        requests in prop::collection::vec((0usize..5, any::<u32>()), 1..16)
    ) {
        let mut session = session();
        let links = all_links(&session);

        for (pick, bits) in requests {
            let (source, sink, _) = links[pick % links.len()];
            session
                .configure_link(source, sink, LinkFlags::from_bits(bits))
                .unwrap();
        }

        assert_twins_agree(&session);
    }
}

#[test]
fn test_invalid_links_are_tolerated() {
    let mut device = pipeline();
    device.add_link((PREVIEW, 7), (OUTPUT, 0), LinkFlags::ENABLED);
    device.add_link((SENSOR, 0), (42, 0), LinkFlags::empty());

    let session = MediaSession::new(device, SessionConfig::default()).unwrap();

    assert_eq!(session.topology().invalid_links().len(), 2);
    assert_eq!(session.topology().links().count(), 5);
    assert_twins_agree(&session);
}

#[test]
fn test_reset_disables_every_mutable_link() {
    let mut session = session();
    session.device_mut().clear_calls();

    let count = session.reset_all_links().unwrap();

    let mutable = all_links(&session).iter().filter(|(_, _, i)| !i).count();
    assert_eq!(count, mutable);
    let setups = session
        .device()
        .calls()
        .iter()
        .filter(|c| matches!(c, DeviceCall::SetupLink { .. }))
        .count();
    assert_eq!(setups, mutable);

    for (_, link) in session.topology().links() {
        assert_eq!(link.flags.is_enabled(), link.flags.is_immutable());
    }
    assert_twins_agree(&session);
}

#[test]
fn test_links_then_formats_propagate_downstream() {
    let mut session = session();
    session.reset_all_links().unwrap();

    session
        .setup_links(
            "\"mt9p031 2-0048\":0->\"OMAP3 ISP CCDC\":0[1], \
             \"OMAP3 ISP CCDC\":2->\"OMAP3 ISP preview\":0[1]",
        )
        .unwrap();

    let reports = session
        .setup_formats(
            "\"mt9p031 2-0048\":0[SGRBG10 2592x1944], \"OMAP3 ISP CCDC\":2[SGRBG10 2592x1944]",
        )
        .unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].propagated.len(), 1);
    assert_eq!(reports[1].propagated.len(), 1);

    let preview_sink = session.parse_pad("\"OMAP3 ISP preview\":0").unwrap();
    assert_eq!(reports[1].propagated[0].0, preview_sink);

    let state = session.pad_format(preview_sink).unwrap();
    assert_eq!(state.to_string(), "[SGRBG10 2592x1944]");

    // The sensor -> preview bypass stayed disabled, so preview saw only one set
    let preview_sets = session
        .device()
        .calls()
        .iter()
        .filter(|c| {
            matches!(
                c,
                DeviceCall::SetFormat {
                    entity: PREVIEW,
                    pad: 0,
                    ..
                }
            )
        })
        .count();
    assert_eq!(preview_sets, 1);
}

#[test]
fn test_batch_error_reports_position() {
    let mut session = session();
    let input = "\"OMAP3 ISP CCDC\":2->\"OMAP3 ISP preview\":0[1], \"nope\":0->1:0[1]";

    let err = session.setup_links(input).unwrap_err();

    match &err {
        MediaError::Batch { index, offset, .. } => {
            assert_eq!(*index, 1);
            assert_eq!(&input[*offset..*offset + 7], "\"nope\":");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("nope"));

    // The first element stays applied
    let source = session.parse_pad("2:2").unwrap();
    let sink = session.parse_pad("3:0").unwrap();
    let link = session.topology().find_link(source, sink).unwrap();
    assert!(session.topology().link(link).flags.is_enabled());
}

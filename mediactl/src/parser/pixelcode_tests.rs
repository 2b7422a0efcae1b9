// pixelcode_tests.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use super::pixelcode::*;

#[test]
fn test_table_matches_variants() {
    // name() and code() index the table by variant, so a lookup by name must
    // land on the same variant.
    for code in PixelCode::all() {
        assert_eq!(code.name().parse::<PixelCode>().unwrap(), code);
        assert_eq!(PixelCode::from_code(code.code()), Some(code));
    }
    assert_eq!(PixelCode::all().count(), 21);
}

#[test]
fn test_known_codes() {
    assert_eq!(PixelCode::Uyvy.code(), 0x200f);
    assert_eq!(PixelCode::Y8.code(), 0x2001);
    assert_eq!(PixelCode::Srggb10Dpcm8.name(), "SRGGB10_DPCM8");
    assert_eq!(PixelCode::Sgrbg12.code(), 0x3011);
}

#[test]
fn test_parse_exact_name_only() {
    assert_eq!("YUYV".parse::<PixelCode>(), Ok(PixelCode::Yuyv));
    assert!("yuyv".parse::<PixelCode>().is_err());
    assert!("SBGGR".parse::<PixelCode>().is_err());
    assert!("SBGGR10_DPCM".parse::<PixelCode>().is_err());

    let err = "RGB888".parse::<PixelCode>().unwrap_err();
    assert_eq!(err.to_string(), "unknown pixel code 'RGB888'");
}

#[test]
fn test_code_name() {
    assert_eq!(code_name(0x3001), "SBGGR8");
    assert_eq!(code_name(0x1234), "unknown");
    assert_eq!(PixelCode::Sgbrg8.to_string(), "SGBRG8");
}

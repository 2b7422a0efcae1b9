// pixelcode.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Media bus pixel codes understood by format descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelCode {
    Y8,
    Y10,
    Y12,
    Yuyv,
    Uyvy,
    Sbggr8,
    Sgbrg8,
    Sgrbg8,
    Srggb8,
    Sbggr10,
    Sgbrg10,
    Sgrbg10,
    Srggb10,
    Sbggr10Dpcm8,
    Sgbrg10Dpcm8,
    Sgrbg10Dpcm8,
    Srggb10Dpcm8,
    Sbggr12,
    Sgbrg12,
    Sgrbg12,
    Srggb12,
}

const PIXEL_CODES: &[(PixelCode, &str, u32)] = &[
    (PixelCode::Y8, "Y8", 0x2001),
    (PixelCode::Y10, "Y10", 0x200a),
    (PixelCode::Y12, "Y12", 0x2013),
    (PixelCode::Yuyv, "YUYV", 0x2011),
    (PixelCode::Uyvy, "UYVY", 0x200f),
    (PixelCode::Sbggr8, "SBGGR8", 0x3001),
    (PixelCode::Sgbrg8, "SGBRG8", 0x3013),
    (PixelCode::Sgrbg8, "SGRBG8", 0x3002),
    (PixelCode::Srggb8, "SRGGB8", 0x3014),
    (PixelCode::Sbggr10, "SBGGR10", 0x3007),
    (PixelCode::Sgbrg10, "SGBRG10", 0x300e),
    (PixelCode::Sgrbg10, "SGRBG10", 0x300a),
    (PixelCode::Srggb10, "SRGGB10", 0x300f),
    (PixelCode::Sbggr10Dpcm8, "SBGGR10_DPCM8", 0x300b),
    (PixelCode::Sgbrg10Dpcm8, "SGBRG10_DPCM8", 0x300c),
    (PixelCode::Sgrbg10Dpcm8, "SGRBG10_DPCM8", 0x3009),
    (PixelCode::Srggb10Dpcm8, "SRGGB10_DPCM8", 0x300d),
    (PixelCode::Sbggr12, "SBGGR12", 0x3008),
    (PixelCode::Sgbrg12, "SGBRG12", 0x3010),
    (PixelCode::Sgrbg12, "SGRBG12", 0x3011),
    (PixelCode::Srggb12, "SRGGB12", 0x3012),
];

impl PixelCode {
    pub fn all() -> impl Iterator<Item = PixelCode> {
        PIXEL_CODES.iter().map(|(code, _, _)| *code)
    }

    // Table rows follow variant declaration order
    fn entry(self) -> &'static (PixelCode, &'static str, u32) {
        &PIXEL_CODES[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Media bus code
    pub fn code(self) -> u32 {
        self.entry().2
    }

    pub fn from_code(code: u32) -> Option<PixelCode> {
        PIXEL_CODES
            .iter()
            .find(|(_, _, value)| *value == code)
            .map(|(pixel, _, _)| *pixel)
    }
}

/// Name of a media bus code, or `unknown`.
pub fn code_name(code: u32) -> &'static str {
    PixelCode::from_code(code).map_or("unknown", PixelCode::name)
}

impl fmt::Display for PixelCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown pixel code '{0}'")]
pub struct UnknownPixelCode(pub String);

impl FromStr for PixelCode {
    type Err = UnknownPixelCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PIXEL_CODES
            .iter()
            .find(|(_, name, _)| *name == s)
            .map(|(code, _, _)| *code)
            .ok_or_else(|| UnknownPixelCode(s.to_string()))
    }
}

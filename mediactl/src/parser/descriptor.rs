// descriptor.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

use super::cursor::Cursor;
use super::pixelcode::PixelCode;
use crate::device::{Fraction, LinkFlags, MbusFrameFormat, Rect};
use crate::error::{MediaError, Result};
use crate::topology::{LinkId, PadId};

/// Maximum length for descriptor input to prevent memory exhaustion
pub const MAX_DESCRIPTOR_LENGTH: usize = 64 * 1024; // 64KB

/// How a descriptor names an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef<'a> {
    Name(&'a str),
    Id(u32),
}

impl fmt::Display for EntityRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Name(name) => write!(f, "\"{}\"", name),
            EntityRef::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Maps descriptor references onto graph elements.
pub trait Resolver {
    /// Fails with [`MediaError::NotFound`] for a missing entity or pad.
    fn resolve_pad(&self, entity: EntityRef<'_>, index: u32) -> Result<PadId>;

    fn resolve_link(&self, source: PadId, sink: PadId) -> Result<LinkId>;
}

/// A parsed `link '[' flags ']'` element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkRequest {
    pub link: LinkId,
    pub source: PadId,
    pub sink: PadId,
    pub flags: LinkFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFormat {
    pub code: PixelCode,
    pub width: u32,
    pub height: u32,
}

impl FrameFormat {
    /// A zero width or height requests no format change.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn to_mbus(&self) -> MbusFrameFormat {
        MbusFrameFormat {
            width: self.width,
            height: self.height,
            code: self.code.code(),
            ..Default::default()
        }
    }
}

impl fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}x{}", self.code, self.width, self.height)
    }
}

/// A parsed `pad '[' ... ']'` element. Absent fields leave the device
/// setting unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadConfig {
    pub pad: PadId,
    pub format: Option<FrameFormat>,
    pub crop: Option<Rect>,
    pub interval: Option<Fraction>,
}

/// Recursive descent parser over one descriptor input.
///
/// Whitespace is accepted between every pair of tokens. Entity and pad
/// references are resolved as soon as they are read, so a reference to a
/// missing element fails with [`MediaError::NotFound`] rather than a syntax
/// error.
#[derive(Debug, Clone)]
pub struct DescriptorParser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> DescriptorParser<'a> {
    pub fn new(input: &'a str) -> Result<Self> {
        if input.len() > MAX_DESCRIPTOR_LENGTH {
            return Err(MediaError::InvalidDescriptor(format!(
                "Descriptor too long: {} bytes (max: {} bytes)",
                input.len(),
                MAX_DESCRIPTOR_LENGTH
            )));
        }

        if input.trim().is_empty() {
            return Err(MediaError::InvalidDescriptor(
                "Empty descriptor".to_string(),
            ));
        }

        Ok(Self {
            cursor: Cursor::new(input),
        })
    }

    /// Byte offset of the next unread character
    pub fn position(&self) -> usize {
        self.cursor.position()
    }

    fn entity_ref(&mut self) -> Result<EntityRef<'a>> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some(b'"') => Ok(EntityRef::Name(self.cursor.quoted()?)),
            Some(c) if c.is_ascii_digit() => Ok(EntityRef::Id(self.cursor.number("entity id")?)),
            _ => Err(self.cursor.error("expected entity name or id")),
        }
    }

    /// `entity-ref ':' pad-index`
    pub fn pad<R: Resolver + ?Sized>(&mut self, resolver: &R) -> Result<PadId> {
        let entity = self.entity_ref()?;

        self.cursor.skip_whitespace();
        self.cursor.expect(b':', "':' after entity")?;
        self.cursor.skip_whitespace();
        let index = self.cursor.number("pad index")?;
        self.cursor.skip_whitespace();

        resolver.resolve_pad(entity, index)
    }

    fn link_endpoints<R: Resolver + ?Sized>(
        &mut self,
        resolver: &R,
    ) -> Result<(PadId, PadId, LinkId)> {
        let source = self.pad(resolver)?;

        if !(self.cursor.eat(b'-') && self.cursor.eat(b'>')) {
            return Err(self.cursor.error("expected '->'"));
        }

        let sink = self.pad(resolver)?;
        let link = resolver.resolve_link(source, sink)?;
        Ok((source, sink, link))
    }

    /// `pad '->' pad`
    pub fn link<R: Resolver + ?Sized>(&mut self, resolver: &R) -> Result<LinkId> {
        self.link_endpoints(resolver).map(|(_, _, link)| link)
    }

    /// `link '[' flags ']'`
    pub fn link_setup<R: Resolver + ?Sized>(&mut self, resolver: &R) -> Result<LinkRequest> {
        let (source, sink, link) = self.link_endpoints(resolver)?;

        self.cursor.skip_whitespace();
        self.cursor.expect(b'[', "'[' before link flags")?;
        self.cursor.skip_whitespace();
        let flags = self.cursor.number("link flags")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b']', "']' after link flags")?;
        self.cursor.skip_whitespace();

        Ok(LinkRequest {
            link,
            source,
            sink,
            flags: LinkFlags::from_bits(flags),
        })
    }

    fn frame_format(&mut self) -> Result<FrameFormat> {
        let start = self.position();
        let name = self.cursor.word();
        let code = name
            .parse::<PixelCode>()
            .map_err(|e| MediaError::syntax(start, e.to_string()))?;

        self.cursor.skip_whitespace();
        let (width, height) = self.size()?;

        Ok(FrameFormat {
            code,
            width,
            height,
        })
    }

    /// `width 'x' height`
    fn size(&mut self) -> Result<(u32, u32)> {
        let width = self.cursor.number("width")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b'x', "'x' between width and height")?;
        self.cursor.skip_whitespace();
        let height = self.cursor.number("height")?;
        Ok((width, height))
    }

    fn offset_value(&mut self, what: &str) -> Result<i32> {
        let start = self.position();
        let value = self.cursor.number(what)?;
        i32::try_from(value)
            .map_err(|_| MediaError::syntax(start, format!("{} {} out of range", what, value)))
    }

    /// `'(' left ',' top ')' '/' width 'x' height`
    fn crop(&mut self) -> Result<Rect> {
        self.cursor.expect(b'(', "'(' before crop rectangle")?;
        self.cursor.skip_whitespace();
        let left = self.offset_value("crop left")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b',', "',' between crop left and top")?;
        self.cursor.skip_whitespace();
        let top = self.offset_value("crop top")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b')', "')' after crop position")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b'/', "'/' before crop size")?;
        self.cursor.skip_whitespace();
        let (width, height) = self.size()?;

        Ok(Rect {
            left,
            top,
            width,
            height,
        })
    }

    /// `numerator '/' denominator`
    fn interval(&mut self) -> Result<Fraction> {
        self.cursor.skip_whitespace();
        let numerator = self.cursor.number("frame interval numerator")?;
        self.cursor.skip_whitespace();
        self.cursor.expect(b'/', "'/' in frame interval")?;
        self.cursor.skip_whitespace();
        let denominator = self.cursor.number("frame interval denominator")?;

        Ok(Fraction {
            numerator,
            denominator,
        })
    }

    /// `pad '[' [format] [crop] ['@' interval] ']'`
    pub fn pad_config<R: Resolver + ?Sized>(&mut self, resolver: &R) -> Result<PadConfig> {
        let pad = self.pad(resolver)?;

        self.cursor.skip_whitespace();
        self.cursor.expect(b'[', "'[' before pad configuration")?;
        self.cursor.skip_whitespace();

        let mut config = PadConfig {
            pad,
            format: None,
            crop: None,
            interval: None,
        };

        if matches!(self.cursor.peek(), Some(c) if c.is_ascii_alphanumeric()) {
            config.format = Some(self.frame_format()?);
            self.cursor.skip_whitespace();
        }

        if self.cursor.peek() == Some(b'(') {
            config.crop = Some(self.crop()?);
            self.cursor.skip_whitespace();
        }

        if self.cursor.eat(b'@') {
            config.interval = Some(self.interval()?);
            self.cursor.skip_whitespace();
        }

        self.cursor.expect(b']', "']' after pad configuration")?;
        self.cursor.skip_whitespace();

        Ok(config)
    }

    /// Consume the separator between two list elements, if present.
    pub fn next_item(&mut self) -> bool {
        self.cursor.skip_whitespace();
        self.cursor.eat(b',')
    }

    /// Fail if anything but whitespace is left.
    pub fn finish(&mut self) -> Result<()> {
        self.cursor.skip_whitespace();
        if self.cursor.is_at_end() {
            Ok(())
        } else {
            Err(self.cursor.error("unexpected trailing characters"))
        }
    }

    /// Run `item` on every comma separated element, then require the end of
    /// input. Stops at the first failure, which is wrapped in
    /// [`MediaError::Batch`] with the element's position. Returns the number
    /// of elements processed.
    pub fn each_item<F>(&mut self, mut item: F) -> Result<usize>
    where
        F: FnMut(&mut DescriptorParser<'a>) -> Result<()>,
    {
        let mut index = 0;
        loop {
            self.cursor.skip_whitespace();
            let start = self.position();
            item(&mut *self).map_err(|e| MediaError::batch(index, start, e))?;
            index += 1;

            if !self.next_item() {
                break;
            }
        }

        let end = self.position();
        self.finish()
            .map_err(|e| MediaError::batch(index - 1, end, e))?;

        Ok(index)
    }
}

pub fn parse_pad<R: Resolver + ?Sized>(input: &str, resolver: &R) -> Result<PadId> {
    let mut parser = DescriptorParser::new(input)?;
    let pad = parser.pad(resolver)?;
    parser.finish()?;
    Ok(pad)
}

pub fn parse_link_setup<R: Resolver + ?Sized>(input: &str, resolver: &R) -> Result<LinkRequest> {
    let mut parser = DescriptorParser::new(input)?;
    let request = parser.link_setup(resolver)?;
    parser.finish()?;
    Ok(request)
}

pub fn parse_pad_config<R: Resolver + ?Sized>(input: &str, resolver: &R) -> Result<PadConfig> {
    let mut parser = DescriptorParser::new(input)?;
    let config = parser.pad_config(resolver)?;
    parser.finish()?;
    Ok(config)
}

/// Parse a whole `link-list` without applying it.
pub fn parse_links<R: Resolver + ?Sized>(input: &str, resolver: &R) -> Result<Vec<LinkRequest>> {
    let mut parser = DescriptorParser::new(input)?;
    let mut requests = Vec::new();
    parser.each_item(|p| {
        requests.push(p.link_setup(resolver)?);
        Ok(())
    })?;
    Ok(requests)
}

/// Parse a whole `format-list` without applying it.
pub fn parse_formats<R: Resolver + ?Sized>(input: &str, resolver: &R) -> Result<Vec<PadConfig>> {
    let mut parser = DescriptorParser::new(input)?;
    let mut configs = Vec::new();
    parser.each_item(|p| {
        configs.push(p.pad_config(resolver)?);
        Ok(())
    })?;
    Ok(configs)
}

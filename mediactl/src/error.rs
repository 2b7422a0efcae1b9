// error.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{context}: {}", errno_message(.code))]
    Device { context: String, code: i32 },

    #[error("Unable to open media device {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Descriptor #{index} at offset {offset}: {source}")]
    Batch {
        index: usize,
        offset: usize,
        #[source]
        source: Box<MediaError>,
    },

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Out of memory while building the media graph")]
    OutOfMemory,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    pub fn syntax(offset: usize, message: impl Into<String>) -> Self {
        MediaError::Syntax {
            offset,
            message: message.into(),
        }
    }

    /// Attach a list element's position to its failure.
    pub fn batch(index: usize, offset: usize, source: MediaError) -> Self {
        MediaError::Batch {
            index,
            offset,
            source: Box::new(source),
        }
    }

    /// Wrap an OS error returned by a device call.
    pub fn device(context: impl Into<String>, err: &std::io::Error) -> Self {
        MediaError::Device {
            context: context.into(),
            code: err.raw_os_error().unwrap_or(libc::EIO),
        }
    }

    /// The kernel errno carried by a device failure, looking through batch wrappers.
    pub fn errno(&self) -> Option<i32> {
        match self {
            MediaError::Device { code, .. } => Some(*code),
            MediaError::Batch { source, .. } => source.errno(),
            _ => None,
        }
    }

    /// Byte offset in the descriptor input where parsing or applying stopped.
    pub fn offset(&self) -> Option<usize> {
        match self {
            MediaError::Syntax { offset, .. } => Some(*offset),
            MediaError::Batch { offset, source, .. } => source.offset().or(Some(*offset)),
            _ => None,
        }
    }
}

fn errno_message(code: &i32) -> String {
    std::io::Error::from_raw_os_error(*code).to_string()
}

pub type Result<T> = std::result::Result<T, MediaError>;

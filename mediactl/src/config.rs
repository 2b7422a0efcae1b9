// config.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

/// Default media controller device node
pub const DEFAULT_MEDIA_DEVICE: &str = "/dev/media0";

/// Default sysfs mount point used to resolve entity device nodes
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

/// Settings for one media device session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Media controller device node to open
    pub device: PathBuf,
    /// Root of the sysfs tree holding `dev/char/<major>:<minor>` links
    pub sysfs_root: PathBuf,
}

impl SessionConfig {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn with_sysfs_root(mut self, sysfs_root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = sysfs_root.into();
        self
    }

    /// sysfs link for a character device number
    pub fn char_device_link(&self, major: u32, minor: u32) -> PathBuf {
        self.sysfs_root
            .join("dev")
            .join("char")
            .join(format!("{}:{}", major, minor))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_MEDIA_DEVICE),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

// devnode.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::DevNumber;
use crate::config::SessionConfig;

/// Directory holding device nodes
pub const DEV_DIR: &str = "/dev";

/// Resolve the `/dev` node of a character device through its sysfs link.
///
/// udev may have renamed or reordered nodes, so the candidate node is only
/// accepted when its device number matches.
pub fn resolve(config: &SessionConfig, dev: DevNumber) -> Option<PathBuf> {
    resolve_in(config, dev, Path::new(DEV_DIR))
}

pub(crate) fn resolve_in(
    config: &SessionConfig,
    dev: DevNumber,
    dev_dir: &Path,
) -> Option<PathBuf> {
    debug!("Looking up device node for {}", dev);

    let link = config.char_device_link(dev.major, dev.minor);
    let target = match fs::read_link(&link) {
        Ok(target) => target,
        Err(e) => {
            debug!("Unable to read {}: {}", link.display(), e);
            return None;
        }
    };

    let name = target.file_name()?;
    let devname = dev_dir.join(name);

    let metadata = match fs::metadata(&devname) {
        Ok(metadata) => metadata,
        Err(e) => {
            debug!("Unable to stat {}: {}", devname.display(), e);
            return None;
        }
    };

    let rdev = metadata.rdev() as libc::dev_t;
    if metadata.file_type().is_char_device()
        && libc::major(rdev) == dev.major
        && libc::minor(rdev) == dev.minor
    {
        Some(devname)
    } else {
        debug!(
            "{} does not match device number {}, ignoring",
            devname.display(),
            dev
        );
        None
    }
}

// devnode_tests.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::os::unix::fs::symlink;

use super::devnode::*;
use super::types::DevNumber;
use crate::config::SessionConfig;

fn sysfs(dir: &tempfile::TempDir) -> SessionConfig {
    fs::create_dir_all(dir.path().join("sys/dev/char")).unwrap();
    SessionConfig::default().with_sysfs_root(dir.path().join("sys"))
}

#[test]
fn test_resolve_missing_sysfs_link() {
    let dir = tempfile::tempdir().unwrap();
    let config = sysfs(&dir);

    let dev = DevNumber {
        major: 81,
        minor: 3,
    };

    assert_eq!(resolve_in(&config, dev, &dir.path().join("dev")), None);
}

#[test]
fn test_resolve_rejects_regular_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = sysfs(&dir);
    let dev_dir = dir.path().join("dev");
    fs::create_dir_all(&dev_dir).unwrap();

    // The sysfs link points at a name that exists in the device directory but
    // is a plain file, so the device number cannot match.
    fs::write(dev_dir.join("v4l-subdev0"), b"").unwrap();
    symlink(
        "../../devices/platform/isp/v4l-subdev0",
        dir.path().join("sys/dev/char/81:3"),
    )
    .unwrap();

    let dev = DevNumber {
        major: 81,
        minor: 3,
    };

    assert_eq!(resolve_in(&config, dev, &dev_dir), None);
}

#[test]
fn test_resolve_rejects_mismatched_device_number() {
    let dir = tempfile::tempdir().unwrap();
    let config = sysfs(&dir);

    // /dev/null is 1:3 on Linux; ask for a different number.
    symlink(
        "../../devices/virtual/mem/null",
        dir.path().join("sys/dev/char/81:3"),
    )
    .unwrap();

    let dev = DevNumber {
        major: 81,
        minor: 3,
    };

    assert_eq!(
        resolve_in(&config, dev, std::path::Path::new(DEV_DIR)),
        None
    );
}

#[test]
fn test_resolve_matching_device_number() {
    let dir = tempfile::tempdir().unwrap();
    let config = sysfs(&dir);

    symlink(
        "../../devices/virtual/mem/null",
        dir.path().join("sys/dev/char/1:3"),
    )
    .unwrap();

    let dev = DevNumber { major: 1, minor: 3 };

    assert_eq!(
        resolve(&config, dev),
        Some(std::path::PathBuf::from("/dev/null"))
    );
}

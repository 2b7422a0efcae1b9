// kernel.rs
//
// Copyright 2026 Stéphane Cerveau <scerveau@igalia.com>
//
// This file is part of MediaCtl
//
// SPDX-License-Identifier: GPL-3.0-only

//! Media controller and V4L2 subdev ioctl transport.
//!
//! The ioctl structures below mirror `<linux/media.h>` and
//! `<linux/v4l2-subdev.h>`. Request numbers use the asm-generic `_IOWR`
//! encoding shared by x86, arm and riscv.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::mem::size_of;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::{
    DevNumber, DeviceInfo, EntityDescriptor, Fraction, LinkDescriptor, LinkFlags, LinksEnum,
    MbusFrameFormat, PadDescriptor, PadFlags, Rect, Which,
};
use super::{devnode, MediaDevice, SubdevRef};
use crate::config::SessionConfig;
use crate::error::{MediaError, Result};

const MEDIA_ENT_ID_FLAG_NEXT: u32 = 1 << 31;

const fn iowr(ty: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((3u32 << 30) | ((size as u32) << 16) | ((ty as u32) << 8) | nr as u32) as libc::c_ulong
}

#[repr(C)]
struct MediaDeviceInfoRaw {
    driver: [u8; 16],
    model: [u8; 32],
    serial: [u8; 40],
    bus_info: [u8; 32],
    media_version: u32,
    hw_revision: u32,
    driver_version: u32,
    reserved: [u32; 31],
}

#[repr(C)]
struct MediaEntityDescRaw {
    id: u32,
    name: [u8; 32],
    type_: u32,
    revision: u32,
    flags: u32,
    group_id: u32,
    pads: u16,
    links: u16,
    reserved: [u32; 4],
    /// Start of the 184-byte union; only the `dev` member is used.
    dev_major: u32,
    dev_minor: u32,
    raw: [u8; 176],
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct MediaPadDescRaw {
    entity: u32,
    index: u16,
    flags: u32,
    reserved: [u32; 2],
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
struct MediaLinkDescRaw {
    source: MediaPadDescRaw,
    sink: MediaPadDescRaw,
    flags: u32,
    reserved: [u32; 2],
}

#[repr(C)]
struct MediaLinksEnumRaw {
    entity: u32,
    pads: *mut MediaPadDescRaw,
    links: *mut MediaLinkDescRaw,
    reserved: [u32; 4],
}

#[repr(C)]
#[derive(Default, Clone, Copy)]
struct V4l2MbusFramefmt {
    width: u32,
    height: u32,
    code: u32,
    field: u32,
    colorspace: u32,
    ycbcr_enc: u16,
    quantization: u16,
    xfer_func: u16,
    flags: u16,
    reserved: [u16; 10],
}

#[repr(C)]
#[derive(Default)]
struct V4l2SubdevFormat {
    which: u32,
    pad: u32,
    format: V4l2MbusFramefmt,
    stream: u32,
    reserved: [u32; 7],
}

#[repr(C)]
#[derive(Default, Clone, Copy)]
struct V4l2Rect {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
}

#[repr(C)]
#[derive(Default)]
struct V4l2SubdevCrop {
    which: u32,
    pad: u32,
    rect: V4l2Rect,
    stream: u32,
    reserved: [u32; 7],
}

#[repr(C)]
#[derive(Default, Clone, Copy)]
struct V4l2Fract {
    numerator: u32,
    denominator: u32,
}

#[repr(C)]
#[derive(Default)]
struct V4l2SubdevFrameInterval {
    pad: u32,
    interval: V4l2Fract,
    stream: u32,
    which: u32,
    reserved: [u32; 7],
}

const _: () = assert!(size_of::<MediaDeviceInfoRaw>() == 256);
const _: () = assert!(size_of::<MediaEntityDescRaw>() == 256);
const _: () = assert!(size_of::<MediaPadDescRaw>() == 20);
const _: () = assert!(size_of::<MediaLinkDescRaw>() == 52);
const _: () = assert!(size_of::<V4l2MbusFramefmt>() == 48);
const _: () = assert!(size_of::<V4l2SubdevFormat>() == 88);
const _: () = assert!(size_of::<V4l2SubdevCrop>() == 56);
const _: () = assert!(size_of::<V4l2SubdevFrameInterval>() == 48);

const MEDIA_IOC_DEVICE_INFO: libc::c_ulong = iowr(b'|', 0x00, size_of::<MediaDeviceInfoRaw>());
const MEDIA_IOC_ENUM_ENTITIES: libc::c_ulong = iowr(b'|', 0x01, size_of::<MediaEntityDescRaw>());
const MEDIA_IOC_ENUM_LINKS: libc::c_ulong = iowr(b'|', 0x02, size_of::<MediaLinksEnumRaw>());
const MEDIA_IOC_SETUP_LINK: libc::c_ulong = iowr(b'|', 0x03, size_of::<MediaLinkDescRaw>());

const VIDIOC_SUBDEV_G_FMT: libc::c_ulong = iowr(b'V', 4, size_of::<V4l2SubdevFormat>());
const VIDIOC_SUBDEV_S_FMT: libc::c_ulong = iowr(b'V', 5, size_of::<V4l2SubdevFormat>());
const VIDIOC_SUBDEV_G_FRAME_INTERVAL: libc::c_ulong =
    iowr(b'V', 21, size_of::<V4l2SubdevFrameInterval>());
const VIDIOC_SUBDEV_S_FRAME_INTERVAL: libc::c_ulong =
    iowr(b'V', 22, size_of::<V4l2SubdevFrameInterval>());
const VIDIOC_SUBDEV_G_CROP: libc::c_ulong = iowr(b'V', 59, size_of::<V4l2SubdevCrop>());
const VIDIOC_SUBDEV_S_CROP: libc::c_ulong = iowr(b'V', 60, size_of::<V4l2SubdevCrop>());

fn ioctl<T>(fd: RawFd, request: libc::c_ulong, arg: &mut T) -> std::io::Result<()> {
    // SAFETY: `arg` is an exclusively borrowed #[repr(C)] structure whose size
    // is encoded in `request`, so the kernel reads and writes within bounds.
    let ret = unsafe { libc::ioctl(fd, request as _, arg as *mut T) };
    if ret < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

fn c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

impl From<&MediaPadDescRaw> for PadDescriptor {
    fn from(raw: &MediaPadDescRaw) -> Self {
        PadDescriptor {
            entity: raw.entity,
            index: raw.index,
            flags: PadFlags::from_bits(raw.flags),
        }
    }
}

impl From<&PadDescriptor> for MediaPadDescRaw {
    fn from(pad: &PadDescriptor) -> Self {
        MediaPadDescRaw {
            entity: pad.entity,
            index: pad.index,
            flags: pad.flags.bits(),
            reserved: [0; 2],
        }
    }
}

impl From<V4l2MbusFramefmt> for MbusFrameFormat {
    fn from(raw: V4l2MbusFramefmt) -> Self {
        MbusFrameFormat {
            width: raw.width,
            height: raw.height,
            code: raw.code,
            field: raw.field,
            colorspace: raw.colorspace,
        }
    }
}

impl From<&MbusFrameFormat> for V4l2MbusFramefmt {
    fn from(format: &MbusFrameFormat) -> Self {
        V4l2MbusFramefmt {
            width: format.width,
            height: format.height,
            code: format.code,
            field: format.field,
            colorspace: format.colorspace,
            ..Default::default()
        }
    }
}

impl From<V4l2Rect> for Rect {
    fn from(raw: V4l2Rect) -> Self {
        Rect {
            left: raw.left,
            top: raw.top,
            width: raw.width,
            height: raw.height,
        }
    }
}

impl From<&Rect> for V4l2Rect {
    fn from(rect: &Rect) -> Self {
        V4l2Rect {
            left: rect.left,
            top: rect.top,
            width: rect.width,
            height: rect.height,
        }
    }
}

/// A media controller device node opened for reading and writing.
///
/// Subdev device nodes are opened on first use and kept until the device is
/// dropped.
pub struct KernelDevice {
    path: PathBuf,
    file: File,
    config: SessionConfig,
    subdevs: HashMap<u32, File>,
}

impl KernelDevice {
    pub fn open(config: &SessionConfig) -> Result<Self> {
        debug!("Opening media device {}", config.device.display());

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|source| MediaError::Open {
                path: config.device.clone(),
                source,
            })?;

        Ok(Self {
            path: config.device.clone(),
            file,
            config: config.clone(),
            subdevs: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }

    fn subdev_fd(&mut self, subdev: SubdevRef<'_>) -> Result<RawFd> {
        match self.subdevs.entry(subdev.id) {
            Entry::Occupied(entry) => Ok(entry.get().as_raw_fd()),
            Entry::Vacant(entry) => {
                let devnode = subdev.devnode.ok_or_else(|| {
                    MediaError::NotFound(format!("device node for entity '{}'", subdev.name))
                })?;
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(devnode)
                    .map_err(|e| {
                        MediaError::device(
                            format!("Failed to open subdev device node {}", devnode.display()),
                            &e,
                        )
                    })?;
                debug!(
                    "Opened subdev device node {} for entity '{}'",
                    devnode.display(),
                    subdev.name
                );
                Ok(entry.insert(file).as_raw_fd())
            }
        }
    }

    fn entity_descriptor(&self, raw: &MediaEntityDescRaw) -> EntityDescriptor {
        let mut desc = EntityDescriptor {
            id: raw.id,
            name: c_string(&raw.name),
            entity_type: raw.type_,
            revision: raw.revision,
            flags: raw.flags,
            group_id: raw.group_id,
            pads: raw.pads,
            links: raw.links,
            dev: None,
            devnode: None,
        };

        if desc.has_device_node() {
            let dev = DevNumber {
                major: raw.dev_major,
                minor: raw.dev_minor,
            };
            desc.dev = Some(dev);
            desc.devnode = devnode::resolve(&self.config, dev);
        }

        desc
    }
}

impl MediaDevice for KernelDevice {
    fn device_info(&mut self) -> Result<DeviceInfo> {
        // SAFETY: plain-old-data structure, all-zero is a valid value.
        let mut raw: MediaDeviceInfoRaw = unsafe { std::mem::zeroed() };
        ioctl(self.fd(), MEDIA_IOC_DEVICE_INFO, &mut raw)
            .map_err(|e| MediaError::device("Unable to query device information", &e))?;

        Ok(DeviceInfo {
            driver: c_string(&raw.driver),
            model: c_string(&raw.model),
            serial: c_string(&raw.serial),
            bus_info: c_string(&raw.bus_info),
            media_version: raw.media_version,
            hw_revision: raw.hw_revision,
            driver_version: raw.driver_version,
        })
    }

    fn enumerate_entities(&mut self) -> Result<Vec<EntityDescriptor>> {
        let mut entities = Vec::new();
        let mut id = 0;

        loop {
            // SAFETY: plain-old-data structure, all-zero is a valid value.
            let mut raw: MediaEntityDescRaw = unsafe { std::mem::zeroed() };
            raw.id = id | MEDIA_ENT_ID_FLAG_NEXT;

            match ioctl(self.fd(), MEDIA_IOC_ENUM_ENTITIES, &mut raw) {
                Ok(()) => {}
                // EINVAL marks the end of the entity list
                Err(e) if e.raw_os_error() == Some(libc::EINVAL) => break,
                Err(e) => {
                    return Err(MediaError::device(
                        format!(
                            "Unable to enumerate entities for device {}",
                            self.path.display()
                        ),
                        &e,
                    ))
                }
            }

            id = raw.id;
            let desc = self.entity_descriptor(&raw);
            debug!(
                "Found entity {} '{}' ({} pads, {} links)",
                desc.id, desc.name, desc.pads, desc.links
            );
            entities.push(desc);
        }

        info!(
            "Found {} entities on {}",
            entities.len(),
            self.path.display()
        );
        Ok(entities)
    }

    fn enumerate_links(&mut self, entity: &EntityDescriptor) -> Result<LinksEnum> {
        let mut pads = vec![MediaPadDescRaw::default(); entity.pads as usize];
        let mut links = vec![MediaLinkDescRaw::default(); entity.links as usize];

        let mut raw = MediaLinksEnumRaw {
            entity: entity.id,
            pads: pads.as_mut_ptr(),
            links: links.as_mut_ptr(),
            reserved: [0; 4],
        };

        ioctl(self.fd(), MEDIA_IOC_ENUM_LINKS, &mut raw).map_err(|e| {
            MediaError::device(
                format!("Unable to enumerate pads and links of entity {}", entity.id),
                &e,
            )
        })?;

        Ok(LinksEnum {
            pads: pads.iter().map(PadDescriptor::from).collect(),
            links: links
                .iter()
                .map(|link| LinkDescriptor {
                    source: PadDescriptor::from(&link.source),
                    sink: PadDescriptor::from(&link.sink),
                    flags: LinkFlags::from_bits(link.flags),
                })
                .collect(),
        })
    }

    fn setup_link(&mut self, link: &LinkDescriptor) -> Result<LinkFlags> {
        let mut raw = MediaLinkDescRaw {
            source: MediaPadDescRaw::from(&link.source),
            sink: MediaPadDescRaw::from(&link.sink),
            flags: link.flags.bits(),
            reserved: [0; 2],
        };

        ioctl(self.fd(), MEDIA_IOC_SETUP_LINK, &mut raw)
            .map_err(|e| MediaError::device("Unable to setup link", &e))?;

        Ok(LinkFlags::from_bits(raw.flags))
    }

    fn get_format(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        which: Which,
    ) -> Result<MbusFrameFormat> {
        let fd = self.subdev_fd(subdev)?;
        let mut fmt = V4l2SubdevFormat {
            which: which as u32,
            pad,
            ..Default::default()
        };

        ioctl(fd, VIDIOC_SUBDEV_G_FMT, &mut fmt)
            .map_err(|e| MediaError::device("Unable to get format", &e))?;

        Ok(fmt.format.into())
    }

    fn set_format(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        format: &MbusFrameFormat,
        which: Which,
    ) -> Result<MbusFrameFormat> {
        let fd = self.subdev_fd(subdev)?;
        let mut fmt = V4l2SubdevFormat {
            which: which as u32,
            pad,
            format: format.into(),
            ..Default::default()
        };

        ioctl(fd, VIDIOC_SUBDEV_S_FMT, &mut fmt)
            .map_err(|e| MediaError::device("Unable to set format", &e))?;

        Ok(fmt.format.into())
    }

    fn get_crop(&mut self, subdev: SubdevRef<'_>, pad: u32, which: Which) -> Result<Rect> {
        let fd = self.subdev_fd(subdev)?;
        let mut crop = V4l2SubdevCrop {
            which: which as u32,
            pad,
            ..Default::default()
        };

        ioctl(fd, VIDIOC_SUBDEV_G_CROP, &mut crop)
            .map_err(|e| MediaError::device("Unable to get crop rectangle", &e))?;

        Ok(crop.rect.into())
    }

    fn set_crop(
        &mut self,
        subdev: SubdevRef<'_>,
        pad: u32,
        rect: &Rect,
        which: Which,
    ) -> Result<Rect> {
        let fd = self.subdev_fd(subdev)?;
        let mut crop = V4l2SubdevCrop {
            which: which as u32,
            pad,
            rect: rect.into(),
            ..Default::default()
        };

        ioctl(fd, VIDIOC_SUBDEV_S_CROP, &mut crop)
            .map_err(|e| MediaError::device("Unable to set crop rectangle", &e))?;

        Ok(crop.rect.into())
    }

    fn get_frame_interval(&mut self, subdev: SubdevRef<'_>) -> Result<Fraction> {
        let fd = self.subdev_fd(subdev)?;
        let mut ival = V4l2SubdevFrameInterval {
            which: Which::Active as u32,
            ..Default::default()
        };

        ioctl(fd, VIDIOC_SUBDEV_G_FRAME_INTERVAL, &mut ival)
            .map_err(|e| MediaError::device("Unable to get frame interval", &e))?;

        Ok(Fraction {
            numerator: ival.interval.numerator,
            denominator: ival.interval.denominator,
        })
    }

    fn set_frame_interval(
        &mut self,
        subdev: SubdevRef<'_>,
        interval: &Fraction,
    ) -> Result<Fraction> {
        let fd = self.subdev_fd(subdev)?;
        let mut ival = V4l2SubdevFrameInterval {
            which: Which::Active as u32,
            interval: V4l2Fract {
                numerator: interval.numerator,
                denominator: interval.denominator,
            },
            ..Default::default()
        };

        ioctl(fd, VIDIOC_SUBDEV_S_FRAME_INTERVAL, &mut ival)
            .map_err(|e| MediaError::device("Unable to set frame interval", &e))?;

        Ok(Fraction {
            numerator: ival.interval.numerator,
            denominator: ival.interval.denominator,
        })
    }
}

impl Drop for KernelDevice {
    fn drop(&mut self) {
        debug!(
            "Closing media device {} ({} subdev handle(s))",
            self.path.display(),
            self.subdevs.len()
        );
    }
}

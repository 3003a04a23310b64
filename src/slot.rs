//! PCI slot names and the numeric ids the kernel publishes for them.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;
use pest::Parser;

use crate::error::{Error, Result};
use crate::pci_id_data::{PciIdsParser, Rule};

pub const SYS_PCI_DIR: &str = "/sys/bus/pci/devices";

const VENDOR: &str = "vendor";
const DEVICE: &str = "device";
const SUBSYSTEM_VENDOR: &str = "subsystem_vendor";
const SUBSYSTEM_DEVICE: &str = "subsystem_device";

/// A slot in `domain:bus:device.function` form, e.g. `0000:01:00.0`.
///
/// Domain and bus are lowercase hex, device and function are decimal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Slot {
    name: String,
    domain: u16,
    bus: u8,
    device: u32,
    function: u32,
}

impl Slot {
    pub fn domain(&self) -> u16 {
        self.domain
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn device(&self) -> u32 {
        self.device
    }

    pub fn function(&self) -> u32 {
        self.function
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl FromStr for Slot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSlot(s.to_owned());

        let slot_pair = PciIdsParser::parse(Rule::slot, s)
            .map_err(|_| invalid())?
            .next()
            .ok_or_else(invalid)?;
        let mut fields = slot_pair.into_inner().map(|pair| pair.as_str());
        let mut next_field = |radix: u32| -> Result<u32> {
            let field = fields.next().ok_or_else(invalid)?;
            u32::from_str_radix(field, radix).map_err(|_| invalid())
        };

        // The grammar bounds domain and bus to 4 and 2 hex digits.
        Ok(Slot {
            domain: next_field(16)? as u16,
            bus: next_field(16)? as u8,
            device: next_field(10)?,
            function: next_field(10)?,
            name: s.to_owned(),
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Ids read for a slot. `None` means the kernel did not report that id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotIds {
    pub vendor: Option<u16>,
    pub device: Option<u16>,
    pub subsystem_vendor: Option<u16>,
    pub subsystem_device: Option<u16>,
}

/// Somewhere the ids of a slot can be read from.
pub trait IdSource {
    fn read_ids(&self, slot: &Slot) -> Result<SlotIds>;
}

/// Reads ids from the per-slot attribute files under a sysfs directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SysfsIdSource {
    root: PathBuf,
}

impl SysfsIdSource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        SysfsIdSource { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_attribute(&self, slot_dir: &Path, attribute: &str) -> Result<Option<u16>> {
        let path = slot_dir.join(attribute);
        if !path.is_file() {
            debug!("{} is missing", path.display());
            return Ok(None);
        }
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{} is missing", path.display());
                return Ok(None);
            }
            Err(source) => return Err(Error::AttributeRead { path, source }),
        };

        let value = contents.trim();
        if value.is_empty() {
            debug!("{} is empty", path.display());
            return Ok(None);
        }
        let id = parse_hex_id(value).map_err(|_| Error::InvalidAttribute {
            path: path.clone(),
            value: value.to_owned(),
        })?;
        debug!("{} = {:04x}", path.display(), id);
        Ok(Some(id))
    }
}

impl Default for SysfsIdSource {
    fn default() -> Self {
        SysfsIdSource::new(SYS_PCI_DIR)
    }
}

impl IdSource for SysfsIdSource {
    fn read_ids(&self, slot: &Slot) -> Result<SlotIds> {
        let slot_dir = self.root.join(slot.as_str());
        if !slot_dir.is_dir() {
            return Err(Error::SlotNotFound {
                slot: slot.to_string(),
                root: self.root.clone(),
            });
        }

        Ok(SlotIds {
            vendor: self.read_attribute(&slot_dir, VENDOR)?,
            device: self.read_attribute(&slot_dir, DEVICE)?,
            subsystem_vendor: self.read_attribute(&slot_dir, SUBSYSTEM_VENDOR)?,
            subsystem_device: self.read_attribute(&slot_dir, SUBSYSTEM_DEVICE)?,
        })
    }
}

/// Parses a 16-bit hex id such as `10de`, `10DE` or `0x10de`.
pub fn parse_hex_id(src: &str) -> Result<u16> {
    u16::from_str_radix(hex_digits(src)?, 16).map_err(|_| Error::InvalidHexId(src.to_owned()))
}

/// Parses an 8-bit hex id such as a class code, `03` or `0x03`.
pub fn parse_hex_u8(src: &str) -> Result<u8> {
    u8::from_str_radix(hex_digits(src)?, 16).map_err(|_| Error::InvalidHexId(src.to_owned()))
}

/// `src` without one optional `0x`/`0X` prefix, if only hex digits remain.
fn hex_digits(src: &str) -> Result<&str> {
    let digits = src
        .strip_prefix("0x")
        .or_else(|| src.strip_prefix("0X"))
        .unwrap_or(src);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidHexId(src.to_owned()));
    }
    Ok(digits)
}

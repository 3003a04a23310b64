//! Name lookups over a parsed [`Database`].
//!
//! Missing ids are an ordinary outcome: the `lookup_*` methods never fail and
//! return an "Unknown ..." string that echoes the ids that could not be
//! resolved. The `find_*` methods return `None` instead, for callers that need
//! to tell a real name from a placeholder.

use crate::pci_id_data::{ClassEntry, Database, DeviceEntry, SubclassEntry, VendorEntry};
use crate::slot::SlotIds;

#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'db> {
    database: &'db Database,
}

impl<'db> NameResolver<'db> {
    pub fn new(database: &'db Database) -> Self {
        NameResolver { database }
    }

    pub fn find_vendor_name(&self, vendor_id: u16) -> Option<&'db str> {
        self.database.vendor(vendor_id).map(VendorEntry::name)
    }

    pub fn find_device_name(&self, vendor_id: u16, device_id: u16) -> Option<&'db str> {
        self.device(vendor_id, device_id).map(DeviceEntry::name)
    }

    pub fn find_subsystem_device_name(
        &self,
        vendor_id: u16,
        device_id: u16,
        subsystem_vendor_id: u16,
        subsystem_device_id: u16,
    ) -> Option<&'db str> {
        self.device(vendor_id, device_id)
            .and_then(|device| device.subsystem(subsystem_vendor_id, subsystem_device_id))
    }

    pub fn find_class_name(&self, class_id: u8) -> Option<&'db str> {
        self.database.class(class_id).map(ClassEntry::name)
    }

    pub fn find_subclass_name(&self, class_id: u8, subclass_id: u8) -> Option<&'db str> {
        self.subclass(class_id, subclass_id).map(SubclassEntry::name)
    }

    pub fn find_prog_if_name(
        &self,
        class_id: u8,
        subclass_id: u8,
        prog_if_id: u8,
    ) -> Option<&'db str> {
        self.subclass(class_id, subclass_id)
            .and_then(|subclass| subclass.prog_if(prog_if_id))
    }

    pub fn lookup_vendor_name(&self, vendor_id: u16) -> String {
        self.find_vendor_name(vendor_id)
            .map(str::to_owned)
            .unwrap_or_else(|| unknown_vendor(Some(vendor_id)))
    }

    pub fn lookup_device_name(&self, vendor_id: u16, device_id: u16) -> String {
        self.find_device_name(vendor_id, device_id)
            .map(str::to_owned)
            .unwrap_or_else(|| unknown_device(Some(vendor_id), Some(device_id)))
    }

    /// Resolves vendor, then device, then the subsystem pair. Anything short
    /// of all three levels resolving gives the unknown subsystem name.
    pub fn lookup_subsystem_device_name(
        &self,
        vendor_id: u16,
        device_id: u16,
        subsystem_vendor_id: u16,
        subsystem_device_id: u16,
    ) -> String {
        self.find_subsystem_device_name(
            vendor_id,
            device_id,
            subsystem_vendor_id,
            subsystem_device_id,
        )
        .map(str::to_owned)
        .unwrap_or_else(|| {
            unknown_subsystem_device(Some(subsystem_vendor_id), Some(subsystem_device_id))
        })
    }

    pub fn lookup_class_name(&self, class_id: u8) -> String {
        self.find_class_name(class_id)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Unknown class {:02x}", class_id))
    }

    pub fn lookup_subclass_name(&self, class_id: u8, subclass_id: u8) -> String {
        self.find_subclass_name(class_id, subclass_id)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Unknown subclass {:02x}:{:02x}", class_id, subclass_id))
    }

    pub fn lookup_prog_if_name(&self, class_id: u8, subclass_id: u8, prog_if_id: u8) -> String {
        self.find_prog_if_name(class_id, subclass_id, prog_if_id)
            .map(str::to_owned)
            .unwrap_or_else(|| {
                format!(
                    "Unknown programming interface {:02x}:{:02x}.{:02x}",
                    class_id, subclass_id, prog_if_id
                )
            })
    }

    /// Names for every id of a slot.
    ///
    /// Each name is resolved on its own. A name whose inputs are not all
    /// present is reported as unknown without consulting the database.
    pub fn resolve(&self, ids: &SlotIds) -> SlotNames {
        let vendor = match ids.vendor {
            Some(vendor_id) => self.lookup_vendor_name(vendor_id),
            None => unknown_vendor(None),
        };
        let device = match (ids.vendor, ids.device) {
            (Some(vendor_id), Some(device_id)) => self.lookup_device_name(vendor_id, device_id),
            (vendor_id, device_id) => unknown_device(vendor_id, device_id),
        };
        let subsystem_vendor = match ids.subsystem_vendor {
            Some(subsystem_vendor_id) => self.lookup_vendor_name(subsystem_vendor_id),
            None => unknown_vendor(None),
        };
        let subsystem_device = match *ids {
            SlotIds {
                vendor: Some(vendor_id),
                device: Some(device_id),
                subsystem_vendor: Some(subsystem_vendor_id),
                subsystem_device: Some(subsystem_device_id),
            } => self.lookup_subsystem_device_name(
                vendor_id,
                device_id,
                subsystem_vendor_id,
                subsystem_device_id,
            ),
            SlotIds {
                subsystem_vendor: subsystem_vendor_id,
                subsystem_device: subsystem_device_id,
                ..
            } => unknown_subsystem_device(subsystem_vendor_id, subsystem_device_id),
        };

        SlotNames {
            vendor,
            device,
            subsystem_vendor,
            subsystem_device,
        }
    }

    fn device(&self, vendor_id: u16, device_id: u16) -> Option<&'db DeviceEntry> {
        self.database
            .vendor(vendor_id)
            .and_then(|vendor| vendor.device(device_id))
    }

    fn subclass(&self, class_id: u8, subclass_id: u8) -> Option<&'db SubclassEntry> {
        self.database
            .class(class_id)
            .and_then(|class| class.subclass(subclass_id))
    }
}

/// The four names reported for a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotNames {
    pub vendor: String,
    pub device: String,
    pub subsystem_vendor: String,
    pub subsystem_device: String,
}

fn hex_id(id: Option<u16>) -> String {
    match id {
        Some(id) => format!("{:04x}", id),
        None => String::from("????"),
    }
}

fn unknown_vendor(vendor_id: Option<u16>) -> String {
    format!("Unknown vendor {}", hex_id(vendor_id))
}

fn unknown_device(vendor_id: Option<u16>, device_id: Option<u16>) -> String {
    format!("Unknown device {}:{}", hex_id(vendor_id), hex_id(device_id))
}

fn unknown_subsystem_device(
    subsystem_vendor_id: Option<u16>,
    subsystem_device_id: Option<u16>,
) -> String {
    format!(
        "Unknown subsystem device {}:{}",
        hex_id(subsystem_vendor_id),
        hex_id(subsystem_device_id)
    )
}

//! Resolve a PCI slot to human readable vendor, device and subsystem names.
//!
//! The names come from a pci.ids database, parsed once into a [`Database`]
//! and queried through a [`NameResolver`]. The ids of a slot are read from
//! sysfs by a [`SysfsIdSource`].

mod error;
mod pci_id_data;
pub mod resolver;
pub mod slot;

pub use crate::error::{Error, Result};
pub use crate::pci_id_data::{ClassEntry, Database, DeviceEntry, SubclassEntry, VendorEntry};
pub use crate::resolver::{NameResolver, SlotNames};
pub use crate::slot::{parse_hex_id, parse_hex_u8, IdSource, Slot, SlotIds, SysfsIdSource};

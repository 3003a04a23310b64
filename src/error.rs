use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The pci.ids file could not be opened.
    #[error("pci.ids database {} is unavailable", path.display())]
    DatabaseUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The pci.ids stream was opened but could not be read as text.
    #[error("pci.ids database could not be read")]
    DatabaseFormat(#[source] io::Error),

    #[error("invalid slot {0:?}, expected domain:bus:device.func")]
    InvalidSlot(String),

    #[error("slot {slot} was not found in {}", root.display())]
    SlotNotFound { slot: String, root: PathBuf },

    #[error("invalid hex id: {0:?}")]
    InvalidHexId(String),

    #[error("attribute {} does not hold a hex id: {value:?}", path.display())]
    InvalidAttribute { path: PathBuf, value: String },

    #[error("could not read attribute {}", path.display())]
    AttributeRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

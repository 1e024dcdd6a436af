//! Ad Variants Studio - object storage
//!
//! Uploaded master assets and generated images are stored as objects:
//! - [`ObjectPath`]: validated `/objects/...` addresses
//! - [`ObjectStore`] with the filesystem backend [`LocalObjectStore`]
//! - [`UploadTickets`]: one-time, expiring upload slots

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod path;
pub mod store;
pub mod uploads;

pub use error::{ObjectError, ObjectResult};
pub use path::ObjectPath;
pub use store::{LocalObjectStore, ObjectStore, StoredObject, OCTET_STREAM};
pub use uploads::{UploadTicket, UploadTickets, DEFAULT_TICKET_TTL};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

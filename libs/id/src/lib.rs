//! # rgb-id
//!
//! Identity types for the RGB resource manager.
//!
//! ## Design Principles
//!
//! - Records are addressed by an [`ObjectKey`] (`namespace/name`), assigned
//!   at creation and never changed
//! - The store stamps every record with a [`RecordUid`] so owner references
//!   survive a delete/recreate under the same key
//! - Managed items get generated names derived from the owning record's name
//!
//! ## Formats
//!
//! - Object key: `default/rgb-sample`
//! - Record UID: `uid_01HV4Z2WQXKJNM8GPQY6VBKC3D`
//! - Item name: `rgb-sample-6f1c2b9e-3d4a-4e7f-9a51-0c2d8b7e4f10`

mod error;
mod key;
mod name;
mod uid;

pub use error::IdError;
pub use key::ObjectKey;
pub use name::{item_name, MAX_NAME_LEN};
pub use uid::RecordUid;

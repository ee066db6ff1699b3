//! A variable-length record manager over a slotted page store: opaque byte
//! records addressed by ids that stay valid across moves, updates, and
//! removals, with pluggable page-placement strategies and id translation.
//!
//! The lower layers (`page`, `pageinfo`, `strategy`, `translator`,
//! `storage-api`, `buffer`, `file`, `binary-helpers`) each own one concern of
//! the format; this crate is where they're wired together into the actual
//! `insert`/`get`/`update`/`remove` surface.

/// `RecordManagerError` and the result alias used throughout this crate.
pub mod errors;

/// On-disk layout for a manager's persisted state.
mod persistence;

/// The `RecordManager` struct.
pub mod record_manager;

pub use errors::{RecordManagerError, RecordManagerResult};
pub use record_manager::RecordManager;

pub use page::PageId;
pub use pageinfo::{PageInformation, PagesMap};
pub use storage_api::PageContainer;
pub use strategy::Strategy;
pub use translator::{ExternalId, Translator};

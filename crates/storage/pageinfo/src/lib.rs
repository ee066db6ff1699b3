//! In-memory page occupancy tracking: `PageInformation` and the ordered
//! pages map built from it. This is the only view of page state a placement
//! strategy is allowed to read.

/// Per-page counters, observed record-number range, and reservation queue.
pub mod page_information;

/// The ordered `pageId -> PageInformation` map.
pub mod pages_map;

pub use page_information::PageInformation;
pub use pages_map::PagesMap;

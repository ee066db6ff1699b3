use page::Tid;

/// The id a record manager caller actually holds. Either the TID itself
/// (under the identity translator) or an opaque 64-bit handle assigned by
/// the map translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalId {
    /// `query`/`insert`/`update`/`remove` are no-ops; the id *is* the TID.
    Direct(Tid),
    /// An id minted by [`crate::map::MapTranslator`].
    Mapped(u64),
}

impl ExternalId {
    /// The TID this id addresses directly, if it is a direct (identity) id.
    pub fn as_direct(self) -> Option<Tid> {
        match self {
            ExternalId::Direct(tid) => Some(tid),
            ExternalId::Mapped(_) => None,
        }
    }

    /// The mapped 64-bit handle, if this is a mapped id.
    pub fn as_mapped(self) -> Option<u64> {
        match self {
            ExternalId::Mapped(handle) => Some(handle),
            ExternalId::Direct(_) => None,
        }
    }
}

use crate::errors::{TranslatorError, TranslatorResult};
use crate::external_id::ExternalId;
use crate::identity::IdentityTranslator;
use crate::map::MapTranslator;
use page::Tid;

/// The id translation layer, as a tagged union of its two concrete forms.
/// Record manager code matches on this enum rather than going through a
/// trait object, mirroring how [`strategy::Strategy`] dispatches its
/// variants — there are exactly two kinds, and they differ enough (one is
/// stateless, one owns a whole hash map) that a shared trait would mostly
/// be boilerplate.
#[derive(Debug)]
pub enum Translator {
    Identity(IdentityTranslator),
    Map(MapTranslator),
}

impl Translator {
    pub fn identity() -> Self {
        Translator::Identity(IdentityTranslator::new())
    }

    pub fn map() -> Self {
        Translator::Map(MapTranslator::new())
    }

    /// Registers a freshly inserted record's TID and returns its external id.
    pub fn insert(&mut self, tid: Tid) -> ExternalId {
        match self {
            Translator::Identity(_) => ExternalId::Direct(tid),
            Translator::Map(map) => map.insert(tid),
        }
    }

    /// Resolves an external id to its current TID.
    pub fn query(&self, id: ExternalId) -> TranslatorResult<Tid> {
        match (self, id) {
            (Translator::Identity(t), ExternalId::Direct(tid)) => {
                t.query(tid).ok_or(TranslatorError::UnknownId { id })
            }
            (Translator::Map(t), ExternalId::Mapped(handle)) => {
                t.query(handle).ok_or(TranslatorError::UnknownId { id })
            }
            _ => Err(TranslatorError::UnknownId { id }),
        }
    }

    /// Records that a record addressed by `id` moved to `new_tid`.
    /// A no-op for the identity translator (link records carry the move instead).
    pub fn update(&mut self, id: ExternalId, new_tid: Tid) -> TranslatorResult<()> {
        match (self, id) {
            (Translator::Identity(_), ExternalId::Direct(_)) => Ok(()),
            (Translator::Map(t), ExternalId::Mapped(handle)) => t.update(handle, new_tid),
            (_, id) => Err(TranslatorError::UnknownId { id }),
        }
    }

    /// Forgets `id`. A no-op for the identity translator.
    pub fn remove(&mut self, id: ExternalId) -> TranslatorResult<()> {
        match (self, id) {
            (Translator::Identity(_), ExternalId::Direct(_)) => Ok(()),
            (Translator::Map(t), ExternalId::Mapped(handle)) => t.remove(handle),
            (_, id) => Err(TranslatorError::UnknownId { id }),
        }
    }

    /// Every live external id, if this translator owns the id space.
    /// `None` signals the record manager should instead enumerate by
    /// walking the pages map.
    pub fn ids(&self) -> Option<Vec<ExternalId>> {
        match self {
            Translator::Identity(_) => None,
            Translator::Map(t) => Some(t.ids().into_iter().map(ExternalId::Mapped).collect()),
        }
    }

    /// Whether this translator needs link-record forwarding to keep
    /// external ids stable across record moves.
    pub fn use_links(&self) -> bool {
        matches!(self, Translator::Identity(_))
    }

    /// Fixed byte width of this translator's external id, if fixed.
    pub fn id_size(&self) -> usize {
        match self {
            Translator::Identity(_) => page::TID_SIZE,
            Translator::Map(_) => 8,
        }
    }

    pub fn write(&self, out: &mut Vec<u8>) -> TranslatorResult<()> {
        match self {
            Translator::Identity(_) => Ok(()),
            Translator::Map(t) => t.write(out),
        }
    }

    /// Restores state previously produced by [`Self::write`]. A no-op for
    /// the identity translator, which has no state of its own.
    pub fn read(&mut self, bytes: &[u8]) -> TranslatorResult<()> {
        match self {
            Translator::Identity(_) => Ok(()),
            Translator::Map(t) => {
                *t = MapTranslator::read(bytes)?;
                Ok(())
            }
        }
    }

    pub fn close(&mut self) -> TranslatorResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page::PageId;

    #[test]
    fn identity_translator_round_trips_and_skips_links_state() {
        let mut translator = Translator::identity();
        let tid = Tid::new(PageId::new(0, 1), 2);
        let id = translator.insert(tid);
        assert_eq!(translator.query(id).unwrap(), tid);
        assert!(translator.use_links());
        assert!(translator.ids().is_none());
    }

    #[test]
    fn map_translator_does_not_use_links() {
        let mut translator = Translator::map();
        let tid = Tid::new(PageId::new(0, 1), 2);
        let id = translator.insert(tid);
        assert_eq!(translator.query(id).unwrap(), tid);
        assert!(!translator.use_links());
        assert_eq!(translator.ids().unwrap().len(), 1);
    }

    #[test]
    fn update_and_remove_on_map_translator_track_current_tid() {
        let mut translator = Translator::map();
        let tid = Tid::new(PageId::new(0, 1), 2);
        let id = translator.insert(tid);
        let moved = Tid::new(PageId::new(0, 9), 0);
        translator.update(id, moved).unwrap();
        assert_eq!(translator.query(id).unwrap(), moved);
        translator.remove(id).unwrap();
        assert!(translator.query(id).is_err());
    }
}

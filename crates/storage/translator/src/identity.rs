use page::Tid;

/// The identity translator: the external id *is* the TID. `insert`,
/// `update`, and `remove` are no-ops — there is no mapping state to keep.
/// Enables link-record forwarding, since a record's TID (and hence its
/// external id) would otherwise change when it moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTranslator;

impl IdentityTranslator {
    pub fn new() -> Self {
        Self
    }

    pub fn query(&self, tid_as_id: Tid) -> Option<Tid> {
        Some(tid_as_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page::PageId;

    #[test]
    fn query_is_the_identity_function() {
        let translator = IdentityTranslator::new();
        let tid = Tid::new(PageId::new(1, 2), 3);
        assert_eq!(translator.query(tid), Some(tid));
    }
}

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page manifest — the ordered list of pages that make up the output document,
// and the mutators that append, remove, reorder, move, and rotate entries.
//
// Every mutator ends by renumbering, so `display_number == position + 1`
// holds for every entry between calls.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::types::{EntryId, PageEntry, Rotation};

/// Ordered, owned list of output pages.
#[derive(Debug, Clone, Default)]
pub struct PageManifest {
    entries: Vec<PageEntry>,
}

/// Immutable view of a manifest handed to the builder and renderer.
#[derive(Debug, Clone, Default)]
pub struct ManifestSnapshot {
    entries: Arc<[PageEntry]>,
}

impl ManifestSnapshot {
    pub fn entries(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at a 1-based page number.
    pub fn page(&self, page: usize) -> Option<&PageEntry> {
        page.checked_sub(1).and_then(|i| self.entries.get(i))
    }
}

impl PageManifest {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Inspection -----------------------------------------------------------

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PageEntry> {
        self.entries.iter()
    }

    /// Entry at a 0-based position.
    pub fn get(&self, position: usize) -> Option<&PageEntry> {
        self.entries.get(position)
    }

    /// 0-based position of the entry with the given identity.
    pub fn position(&self, id: &EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == *id)
    }

    pub fn entry(&self, id: &EntryId) -> Option<&PageEntry> {
        self.position(id).map(|i| &self.entries[i])
    }

    pub fn ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(PageEntry::id).collect()
    }

    pub fn snapshot(&self) -> ManifestSnapshot {
        ManifestSnapshot {
            entries: Arc::from(self.entries.as_slice()),
        }
    }

    // -- Mutators -------------------------------------------------------------

    /// Append entries in the given order. Returns the 0-based position of the
    /// first appended entry.
    pub fn append(&mut self, entries: impl IntoIterator<Item = PageEntry>) -> usize {
        let first = self.entries.len();
        self.entries.extend(entries);
        self.renumber();
        debug!(added = self.entries.len() - first, total = self.entries.len(), "entries appended");
        first
    }

    /// Remove the entry with the given identity. No-op when absent.
    pub fn remove(&mut self, id: &EntryId) -> Option<PageEntry> {
        let position = self.position(id)?;
        let removed = self.entries.remove(position);
        self.renumber();
        Some(removed)
    }

    /// Replace the ordering with `order`.
    ///
    /// Identities that match nothing, or repeat an earlier one, are dropped.
    /// Entries that `order` leaves out follow the placed ones in their
    /// previous relative order. Returns how many entries were placed from
    /// `order`.
    pub fn reorder(&mut self, order: &[EntryId]) -> usize {
        let mut remaining: Vec<Option<PageEntry>> =
            std::mem::take(&mut self.entries).into_iter().map(Some).collect();
        let mut seen = HashSet::with_capacity(order.len());
        let mut placed = Vec::with_capacity(remaining.len());

        for id in order {
            if !seen.insert(*id) {
                continue;
            }
            let found = remaining
                .iter_mut()
                .find(|slot| matches!(slot, Some(entry) if entry.id() == *id))
                .and_then(Option::take);
            match found {
                Some(entry) => placed.push(entry),
                None => debug!(?id, "reorder: unknown entry ignored"),
            }
        }

        let matched = placed.len();
        placed.extend(remaining.into_iter().flatten());
        self.entries = placed;
        self.renumber();
        matched
    }

    /// Move one entry to `to_position` (0-based, clamped). Returns the new
    /// position, or `None` if the entry is absent.
    pub fn move_entry(&mut self, id: &EntryId, to_position: usize) -> Option<usize> {
        let from = self.position(id)?;
        let entry = self.entries.remove(from);
        let to = to_position.min(self.entries.len());
        self.entries.insert(to, entry);
        self.renumber();
        Some(to)
    }

    /// Rotate the matching entry by `delta_degrees`. Returns the new rotation,
    /// or `Ok(None)` if the entry is absent.
    pub fn rotate(&mut self, id: &EntryId, delta_degrees: i32) -> Result<Option<Rotation>> {
        let Some(position) = self.position(id) else {
            return Ok(None);
        };
        let entry = &mut self.entries[position];
        entry.rotation = entry.rotation.rotated_by(delta_degrees)?;
        Ok(Some(entry.rotation))
    }

    fn renumber(&mut self) {
        for (position, entry) in self.entries.iter_mut().enumerate() {
            entry.display_number = position + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HeftwerkError;
    use crate::types::{PageSize, SourceId, SourceRef};
    use proptest::prelude::*;

    fn source(name: &str) -> SourceRef {
        SourceRef {
            id: SourceId::new(),
            name: name.into(),
        }
    }

    fn pages(source: &SourceRef, count: usize) -> Vec<PageEntry> {
        (0..count)
            .map(|i| PageEntry::new(source.clone(), i, PageSize::A4, None))
            .collect()
    }

    fn numbers(manifest: &PageManifest) -> Vec<usize> {
        manifest.iter().map(|e| e.display_number).collect()
    }

    fn assert_numbered(manifest: &PageManifest) {
        let expected: Vec<usize> = (1..=manifest.len()).collect();
        assert_eq!(numbers(manifest), expected);
    }

    #[test]
    fn append_keeps_source_order_and_numbers() {
        let a = source("a.pdf");
        let b = source("b.pdf");
        let mut manifest = PageManifest::new();
        assert_eq!(manifest.append(pages(&a, 2)), 0);
        assert_eq!(manifest.append(pages(&b, 1)), 2);

        assert_eq!(
            manifest.ids(),
            vec![EntryId::new(a.id, 0), EntryId::new(a.id, 1), EntryId::new(b.id, 0)]
        );
        assert_eq!(numbers(&manifest), vec![1, 2, 3]);
    }

    #[test]
    fn full_scenario() {
        let a = source("A.pdf");
        let b = source("B.pdf");
        let (a0, a1, b0) = (EntryId::new(a.id, 0), EntryId::new(a.id, 1), EntryId::new(b.id, 0));

        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 2));
        manifest.append(pages(&b, 1));

        assert_eq!(manifest.reorder(&[a1, b0, a0]), 3);
        assert_eq!(manifest.ids(), vec![a1, b0, a0]);
        assert_numbered(&manifest);

        manifest.rotate(&a0, 90).unwrap();
        let r = manifest.rotate(&a0, 90).unwrap();
        assert_eq!(r, Some(Rotation::HALF));

        assert!(manifest.remove(&b0).is_some());
        assert_eq!(manifest.ids(), vec![a1, a0]);
        assert_eq!(numbers(&manifest), vec![1, 2]);
    }

    #[test]
    fn removing_absent_entry_is_noop() {
        let a = source("a.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 2));
        let before = manifest.ids();

        assert!(manifest.remove(&EntryId::new(SourceId::new(), 0)).is_none());
        assert!(manifest.remove(&EntryId::new(a.id, 7)).is_none());
        assert_eq!(manifest.ids(), before);
        assert_numbered(&manifest);
    }

    #[test]
    fn same_name_sources_do_not_collide() {
        let first = source("scan.pdf");
        let second = source("scan.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&first, 1));
        manifest.append(pages(&second, 1));

        manifest.remove(&EntryId::new(second.id, 0));
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get(0).unwrap().source.id, first.id);
    }

    #[test]
    fn reorder_drops_unknown_and_duplicate_ids_and_keeps_omitted_entries() {
        let a = source("a.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 4));
        let ids = manifest.ids();
        let stranger = EntryId::new(SourceId::new(), 0);

        let placed = manifest.reorder(&[ids[2], stranger, ids[2], ids[0]]);
        assert_eq!(placed, 2);
        assert_eq!(manifest.ids(), vec![ids[2], ids[0], ids[1], ids[3]]);
        assert_numbered(&manifest);
    }

    #[test]
    fn move_entry_clamps_target() {
        let a = source("a.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 3));
        let ids = manifest.ids();

        assert_eq!(manifest.move_entry(&ids[0], 99), Some(2));
        assert_eq!(manifest.ids(), vec![ids[1], ids[2], ids[0]]);
        assert_eq!(manifest.move_entry(&ids[0], 0), Some(0));
        assert_eq!(manifest.ids(), ids);
        assert_numbered(&manifest);
        assert_eq!(manifest.move_entry(&EntryId::new(SourceId::new(), 0), 1), None);
    }

    #[test]
    fn rotate_validates_delta_and_reports_missing_entries() {
        let a = source("a.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 1));
        let id = EntryId::new(a.id, 0);

        assert_eq!(manifest.rotate(&id, -90).unwrap(), Some(Rotation::THREE_QUARTERS));
        assert!(matches!(manifest.rotate(&id, 45), Err(HeftwerkError::InvalidRotation(45))));
        assert_eq!(manifest.entry(&id).unwrap().rotation, Rotation::THREE_QUARTERS);
        assert_eq!(manifest.rotate(&EntryId::new(a.id, 5), 90).unwrap(), None);
    }

    #[test]
    fn numbering_holds_across_mixed_operations() {
        let a = source("a.pdf");
        let b = source("b.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 3));
        assert_numbered(&manifest);
        manifest.append(pages(&b, 2));
        assert_numbered(&manifest);

        let mut ids = manifest.ids();
        ids.reverse();
        manifest.reorder(&ids);
        assert_numbered(&manifest);

        manifest.remove(&ids[1]);
        assert_numbered(&manifest);
        manifest.move_entry(&ids[4], 1);
        assert_numbered(&manifest);
        manifest.remove(&ids[0]);
        manifest.remove(&ids[2]);
        assert_numbered(&manifest);
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn snapshot_is_detached_from_later_mutation() {
        let a = source("a.pdf");
        let mut manifest = PageManifest::new();
        manifest.append(pages(&a, 2));
        let snapshot = manifest.snapshot();

        manifest.rotate(&EntryId::new(a.id, 0), 90).unwrap();
        manifest.remove(&EntryId::new(a.id, 1));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.page(1).unwrap().rotation, Rotation::NONE);
        assert!(snapshot.page(0).is_none());
        assert!(snapshot.page(3).is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Remove(usize),
        RemoveAbsent,
        Rotate(usize, i32),
        Reorder(Vec<usize>),
        Move(usize, usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            any::<usize>().prop_map(Op::Remove),
            Just(Op::RemoveAbsent),
            (any::<usize>(), prop_oneof![Just(90), Just(-90)]).prop_map(|(i, d)| Op::Rotate(i, d)),
            proptest::collection::vec(any::<usize>(), 0..12).prop_map(Op::Reorder),
            (any::<usize>(), 0usize..16).prop_map(|(i, to)| Op::Move(i, to)),
        ]
    }

    fn entries(manifest: &PageManifest) -> Vec<PageEntry> {
        manifest.iter().cloned().collect()
    }

    proptest! {
        #[test]
        fn random_mutations_keep_numbering_and_rotations_valid(
            initial in 0usize..10,
            ops in proptest::collection::vec(op(), 0..40),
        ) {
            let a = source("a.pdf");
            let mut manifest = PageManifest::new();
            manifest.append(pages(&a, initial));

            for op in ops {
                let ids = manifest.ids();
                let pick = |i: usize| (!ids.is_empty()).then(|| ids[i % ids.len()]);
                match op {
                    Op::Remove(i) => {
                        if let Some(id) = pick(i) {
                            prop_assert!(manifest.remove(&id).is_some());
                            prop_assert_eq!(manifest.len(), ids.len() - 1);
                        }
                    }
                    Op::RemoveAbsent => {
                        let before = entries(&manifest);
                        prop_assert!(manifest.remove(&EntryId::new(SourceId::new(), 0)).is_none());
                        prop_assert_eq!(entries(&manifest), before);
                    }
                    Op::Rotate(i, delta) => {
                        if let Some(id) = pick(i) {
                            prop_assert!(manifest.rotate(&id, delta).unwrap().is_some());
                        }
                    }
                    Op::Reorder(picks) => {
                        let order: Vec<EntryId> = picks.into_iter().filter_map(pick).collect();
                        manifest.reorder(&order);
                        let before: HashSet<EntryId> = ids.iter().copied().collect();
                        let after: HashSet<EntryId> = manifest.ids().into_iter().collect();
                        prop_assert_eq!(manifest.len(), ids.len());
                        prop_assert_eq!(after, before);
                    }
                    Op::Move(i, to) => {
                        if let Some(id) = pick(i) {
                            let landed = manifest.move_entry(&id, to);
                            prop_assert_eq!(landed, Some(to.min(ids.len() - 1)));
                            prop_assert_eq!(manifest.position(&id), landed);
                        }
                    }
                }

                for (position, entry) in manifest.iter().enumerate() {
                    prop_assert_eq!(entry.display_number, position + 1);
                    prop_assert!([0, 90, 180, 270].contains(&entry.rotation.degrees()));
                }
            }
        }

        #[test]
        fn quarter_turns_cancel_out(turns in 0usize..4, page in 0usize..5) {
            let a = source("a.pdf");
            let mut manifest = PageManifest::new();
            manifest.append(pages(&a, 5));
            let id = EntryId::new(a.id, page);
            for _ in 0..turns {
                manifest.rotate(&id, 90).unwrap();
            }
            let start = manifest.entry(&id).unwrap().rotation;

            for _ in 0..4 {
                manifest.rotate(&id, 90).unwrap();
            }
            prop_assert_eq!(manifest.entry(&id).unwrap().rotation, start);

            manifest.rotate(&id, 90).unwrap();
            manifest.rotate(&id, -90).unwrap();
            prop_assert_eq!(manifest.entry(&id).unwrap().rotation, start);
        }
    }
}

//! Paged sparse→dense index (§4.3): maps entity index to a position in a
//! packed dense array of entity ids, via a two-level paged sparse table.
//! Every membership/insert/remove operation is O(1); pages are allocated
//! lazily so memory stays proportional to distinct pages touched rather
//! than the largest issued index.

use tracing::trace;

use crate::config::SparseSetConfig;
use crate::entity_handle::{EntityHandle, EntityId};
use crate::error::{EcsResult, StatusErr, StatusResult};

/// Sentinel written into a sparse cell that holds no dense index. Plays the
/// role of the spec's `-1`/`TOMBSTONE` marker; `usize` has no negative
/// range so `usize::MAX` stands in for it. Also covers the "never written"
/// state of a freshly allocated page — both read as "absent" under the
/// `contains` test, which is all the invariants require.
const TOMBSTONE: usize = usize::MAX;

type Page = Box<[usize]>;

fn new_page(page_size: usize) -> Page {
    vec![TOMBSTONE; page_size].into_boxed_slice()
}

/// Paged sparse set of entity ids.
///
/// `sparse[page_index(e)][page_offset(e)]` is either `TOMBSTONE` or a dense
/// index in `[0, length)`. `dense[i]` is the entity id currently occupying
/// dense position `i`.
pub struct SparseSet {
    handle: EntityHandle,
    page_size: usize,
    page_bits: u32,
    page_mask: usize,
    pages: Vec<Option<Page>>,
    dense: Vec<EntityId>,
    typed: bool,
    pool_size: usize,
}

impl SparseSet {
    pub fn new(config: SparseSetConfig) -> EcsResult<Self> {
        config.validate()?;

        let dense = if config.typed {
            Vec::with_capacity(config.pool_size)
        } else {
            Vec::new()
        };

        Ok(Self {
            handle: config.handle,
            page_size: config.page_size,
            page_bits: config.page_size.trailing_zeros(),
            page_mask: config.page_size - 1,
            pages: Vec::new(),
            dense,
            typed: config.typed,
            pool_size: config.pool_size,
        })
    }

    #[inline]
    fn page_index(&self, e: EntityId) -> usize {
        (self.handle.index(e) as usize) >> self.page_bits
    }

    #[inline]
    fn page_offset(&self, e: EntityId) -> usize {
        (self.handle.index(e) as usize) & self.page_mask
    }

    fn ensure_page(&mut self, page_index: usize) -> &mut Page {
        if page_index >= self.pages.len() {
            self.pages.resize_with(page_index + 1, || None);
        }
        let page_size = self.page_size;
        self.pages[page_index].get_or_insert_with(|| new_page(page_size))
    }

    /// Current packed length.
    #[inline]
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.dense.capacity()
    }

    /// The packed entity ids in dense order. Iteration order matches
    /// insertion order up to swaps induced by `remove`, `swap`, and `sort`.
    #[inline]
    pub fn dense(&self) -> &[EntityId] {
        &self.dense
    }

    /// True iff the relevant page exists, the offset cell is set, not
    /// `TOMBSTONE`, and strictly less than `length`.
    pub fn contains(&self, e: EntityId) -> bool {
        match self.pages.get(self.page_index(e)).and_then(Option::as_ref) {
            Some(page) => {
                let v = page[self.page_offset(e)];
                v != TOMBSTONE && v < self.dense.len()
            }
            None => false,
        }
    }

    /// The dense index of `e`, or `None` if absent.
    pub fn index_of(&self, e: EntityId) -> Option<usize> {
        let page = self.pages.get(self.page_index(e)).and_then(Option::as_ref)?;
        let v = page[self.page_offset(e)];
        (v != TOMBSTONE && v < self.dense.len()).then_some(v)
    }

    /// Inserts `e` if absent, growing the dense array when `auto_resize` is
    /// set. Idempotent: re-adding a present entity returns its existing
    /// index and leaves the set unchanged.
    pub fn add(&mut self, e: EntityId, auto_resize: bool) -> StatusResult<usize> {
        if let Some(i) = self.index_of(e) {
            return Ok(i);
        }

        if self.dense.len() == self.dense.capacity() {
            if !auto_resize {
                return Err(StatusErr);
            }
            let new_cap = if self.dense.capacity() == 0 {
                self.pool_size.max(1)
            } else {
                self.dense.capacity() * 2
            };
            self.dense.reserve(new_cap - self.dense.len());
        }

        let position = self.dense.len();
        let page_index = self.page_index(e);
        let offset = self.page_offset(e);
        self.ensure_page(page_index)[offset] = position;
        self.dense.push(e);

        trace!(index = self.handle.index(e), position, "sparse set insert");
        Ok(position)
    }

    /// Removes `e` via swap-with-last, preserving every other entry's dense
    /// index except the one that moved into the vacated slot.
    pub fn remove(&mut self, e: EntityId) -> StatusResult<()> {
        let Some(i) = self.index_of(e) else {
            return Err(StatusErr);
        };

        let last = self.dense.len() - 1;

        if i != last {
            let moved = self.dense[last];
            self.dense.swap(i, last);
            let page_index = self.page_index(moved);
            let offset = self.page_offset(moved);
            self.ensure_page(page_index)[offset] = i;
        }

        self.dense.pop();
        let page_index = self.page_index(e);
        let offset = self.page_offset(e);
        self.ensure_page(page_index)[offset] = TOMBSTONE;

        Ok(())
    }

    /// Exchanges the dense positions of `a` and `b`. Both must be present
    /// and distinct.
    pub fn swap(&mut self, a: EntityId, b: EntityId) -> StatusResult<()> {
        let (Some(ia), Some(ib)) = (self.index_of(a), self.index_of(b)) else {
            return Err(StatusErr);
        };
        if ia == ib {
            return Err(StatusErr);
        }

        self.dense.swap(ia, ib);

        let (pa, oa) = (self.page_index(a), self.page_offset(a));
        let (pb, ob) = (self.page_index(b), self.page_offset(b));
        self.ensure_page(pa)[oa] = ib;
        self.ensure_page(pb)[ob] = ia;

        Ok(())
    }

    /// Sorts the dense array by `cmp`, then rebuilds every touched sparse
    /// cell by walking the new order. `cmp` must be a total order;
    /// stability is not guaranteed. A set of length <= 1 is already sorted
    /// and this still reports success.
    pub fn sort(
        &mut self,
        mut cmp: impl FnMut(&EntityId, &EntityId) -> std::cmp::Ordering,
    ) -> StatusResult<()> {
        if self.dense.len() <= 1 {
            return Ok(());
        }

        self.dense.sort_unstable_by(&mut cmp);

        for (i, &e) in self.dense.iter().enumerate() {
            let page_index = self.page_index(e);
            let offset = self.page_offset(e);
            self.ensure_page(page_index)[offset] = i;
        }

        Ok(())
    }

    /// Grows the dense array's capacity to `new_cap`. Fails if `new_cap` is
    /// not greater than the current capacity.
    pub fn resize(&mut self, new_cap: usize) -> StatusResult<()> {
        if new_cap <= self.dense.capacity() {
            return Err(StatusErr);
        }
        self.dense.reserve(new_cap - self.dense.len());
        Ok(())
    }

    /// Drops all pages and empties the dense array. Frees the memory a
    /// lazily-allocated page pack held; call [`SparseSet::reset`] instead
    /// to keep pages around for reuse.
    pub fn clear(&mut self) {
        self.pages.clear();
        self.dense.clear();
    }

    /// Empties the dense array without releasing pages, so a subsequent
    /// burst of inserts into the same index range doesn't need to
    /// reallocate them.
    pub fn reset(&mut self) {
        self.dense.clear();
    }

    #[inline]
    pub fn typed(&self) -> bool {
        self.typed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(page_size: usize, pool_size: usize) -> SparseSetConfig {
        SparseSetConfig {
            handle: EntityHandle::medium(),
            page_size,
            pool_size,
            typed: true,
        }
    }

    fn eid(handle: &EntityHandle, index: u32) -> EntityId {
        handle.make(index, 0)
    }

    #[test]
    fn add_is_idempotent() {
        let handle = EntityHandle::medium();
        let mut set = SparseSet::new(config(128, 4)).unwrap();
        let e = eid(&handle, 5);

        let i1 = set.add(e, true).unwrap();
        let i2 = set.add(e, true).unwrap();
        assert_eq!(i1, i2);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn swap_remove_preserves_other_entries() {
        let handle = EntityHandle::medium();
        let mut set = SparseSet::new(config(128, 4)).unwrap();
        let a = eid(&handle, 1);
        let b = eid(&handle, 2);
        let d = eid(&handle, 3);

        set.add(a, true).unwrap();
        set.add(b, true).unwrap();
        set.add(d, true).unwrap();

        set.remove(b).unwrap();

        assert!(!set.contains(b));
        assert_eq!(set.dense(), &[a, d]);
        assert_eq!(set.index_of(a), Some(0));
        assert_eq!(set.index_of(d), Some(1));
    }

    #[test]
    fn capacity_growth_disabled_rejects_overflow() {
        let handle = EntityHandle::medium();
        let cfg = config(128, 2);
        let mut set = SparseSet::new(cfg).unwrap();

        assert!(set.add(eid(&handle, 1), false).is_ok());
        assert!(set.add(eid(&handle, 2), false).is_ok());
        assert!(set.add(eid(&handle, 3), false).is_err());
        assert_eq!(set.len(), 2);
        assert!(!set.contains(eid(&handle, 3)));
    }

    #[test]
    fn page_boundary_crossing_allocates_lazily() {
        let handle = EntityHandle::large();
        let mut set = SparseSet::new(config(128, 4)).unwrap();

        set.add(eid(&handle, 127), true).unwrap();
        assert_eq!(set.pages.len(), 1);

        set.add(eid(&handle, 128), true).unwrap();
        assert_eq!(set.pages.len(), 2);
        assert!(set.pages[0].is_some());
        assert!(set.pages[1].is_some());
    }

    #[test]
    fn sort_rebuilds_sparse_mapping() {
        let handle = EntityHandle::medium();
        let mut set = SparseSet::new(config(128, 4)).unwrap();
        let (a, b, c) = (eid(&handle, 1), eid(&handle, 2), eid(&handle, 3));
        set.add(a, true).unwrap();
        set.add(b, true).unwrap();
        set.add(c, true).unwrap();

        set.sort(|x, y| handle.index(*x).cmp(&handle.index(*y)).reverse());

        assert_eq!(set.dense(), &[c, b, a]);
        for (i, &e) in set.dense().iter().enumerate() {
            assert_eq!(set.index_of(e), Some(i));
        }
    }

    #[test]
    fn reset_keeps_pages_clear_drops_them() {
        let handle = EntityHandle::medium();
        let mut set = SparseSet::new(config(128, 4)).unwrap();
        set.add(eid(&handle, 1), true).unwrap();

        set.reset();
        assert_eq!(set.len(), 0);
        assert!(!set.pages.is_empty());

        set.add(eid(&handle, 1), true).unwrap();
        set.clear();
        assert_eq!(set.len(), 0);
        assert!(set.pages.is_empty());
    }
}

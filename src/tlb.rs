use tracing::debug;

use crate::base::{FrameNumber, PageNumber, SegmentNumber, TLB_ENTRIES};
use crate::policy::{EvictionPolicy, PolicyKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TlbEntry {
    segment: SegmentNumber,
    page: PageNumber,
    frame: FrameNumber,
}

/// Small fully-associative cache of recent (segment, page) -> frame
/// mappings. Victim choice on overflow is delegated to the configured
/// eviction policy; entries are only removed by overwrite or by the
/// coherence invalidations below.
pub struct TranslationCache {
    entries: Vec<Option<TlbEntry>>,
    policy: Box<dyn EvictionPolicy>,
}

impl TranslationCache {
    pub fn new(policy: PolicyKind) -> Self {
        TranslationCache {
            entries: vec![None; TLB_ENTRIES],
            policy: policy.build(TLB_ENTRIES),
        }
    }

    /// Pure scan, no metadata mutation. The concurrent lookup mode runs
    /// this from a second thread while the cache is borrowed read-only;
    /// the caller applies `touch` after the threads are joined.
    pub fn probe(&self, segment: SegmentNumber, page: PageNumber) -> Option<(usize, FrameNumber)> {
        self.entries.iter().enumerate().find_map(|(slot, entry)| {
            entry
                .filter(|e| e.segment == segment && e.page == page)
                .map(|e| (slot, e.frame))
        })
    }

    /// Record a hit on `slot` with the policy.
    pub fn touch(&mut self, slot: usize) {
        self.policy.record_access(slot);
    }

    /// Scan for (segment, page); on a hit the policy metadata is updated.
    pub fn lookup(&mut self, segment: SegmentNumber, page: PageNumber) -> Option<FrameNumber> {
        let (slot, frame) = self.probe(segment, page)?;
        self.touch(slot);
        Some(frame)
    }

    /// Install a mapping: free slot first, else the policy victim is
    /// overwritten.
    pub fn insert(&mut self, segment: SegmentNumber, page: PageNumber, frame: FrameNumber) {
        let slot = match self.entries.iter().position(|e| e.is_none()) {
            Some(free) => free,
            None => {
                let victim = self.policy.choose_victim();
                debug!(slot = victim, "translation cache eviction");
                victim
            }
        };
        self.entries[slot] = Some(TlbEntry {
            segment,
            page,
            frame,
        });
        self.policy.record_access(slot);
    }

    /// Drop any entry referring to `frame`. Called when the frame is
    /// reassigned to another page, so the cache stays a coherent subset
    /// of the page table.
    pub fn invalidate_frame(&mut self, frame: FrameNumber) {
        for slot in 0..self.entries.len() {
            if self.entries[slot].is_some_and(|e| e.frame == frame) {
                self.entries[slot] = None;
                self.policy.release(slot);
            }
        }
    }

    /// Drop every entry of `segment`. Called when the segment's directory
    /// slot is reassigned and its resident pages become stale.
    pub fn invalidate_segment(&mut self, segment: SegmentNumber) {
        for slot in 0..self.entries.len() {
            if self.entries[slot].is_some_and(|e| e.segment == segment) {
                self.entries[slot] = None;
                self.policy.release(slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_misses_on_empty_cache() {
        let mut tlb = TranslationCache::new(PolicyKind::Lru);
        assert_eq!(tlb.lookup(0, 7), None);
    }

    #[test]
    fn insert_then_lookup_hits() {
        let mut tlb = TranslationCache::new(PolicyKind::Lru);
        tlb.insert(0, 7, 3);
        assert_eq!(tlb.lookup(0, 7), Some(3));
        assert_eq!(tlb.lookup(1, 7), None);
    }

    #[test]
    fn overflow_evicts_the_lru_entry() {
        let mut tlb = TranslationCache::new(PolicyKind::Lru);
        for page in 0..TLB_ENTRIES as u32 {
            tlb.insert(0, page, page);
        }
        // Refresh page 0, then overflow: page 1 is now the oldest.
        assert_eq!(tlb.lookup(0, 0), Some(0));
        tlb.insert(0, 100, 100);
        assert_eq!(tlb.lookup(0, 0), Some(0));
        assert_eq!(tlb.lookup(0, 1), None);
        assert_eq!(tlb.lookup(0, 100), Some(100));
    }

    #[test]
    fn fifo_overflow_ignores_hits() {
        let mut tlb = TranslationCache::new(PolicyKind::Fifo);
        for page in 0..TLB_ENTRIES as u32 {
            tlb.insert(0, page, page);
        }
        // Page 0 is hit but still leaves first under FIFO.
        assert_eq!(tlb.lookup(0, 0), Some(0));
        tlb.insert(0, 100, 100);
        assert_eq!(tlb.lookup(0, 0), None);
    }

    #[test]
    fn invalidate_frame_drops_only_that_mapping() {
        let mut tlb = TranslationCache::new(PolicyKind::Lru);
        tlb.insert(0, 1, 10);
        tlb.insert(0, 2, 11);
        tlb.invalidate_frame(10);
        assert_eq!(tlb.lookup(0, 1), None);
        assert_eq!(tlb.lookup(0, 2), Some(11));
    }

    #[test]
    fn invalidate_segment_drops_all_its_entries() {
        let mut tlb = TranslationCache::new(PolicyKind::Lru);
        tlb.insert(1, 1, 10);
        tlb.insert(1, 2, 11);
        tlb.insert(2, 1, 12);
        tlb.invalidate_segment(1);
        assert_eq!(tlb.lookup(1, 1), None);
        assert_eq!(tlb.lookup(1, 2), None);
        assert_eq!(tlb.lookup(2, 1), Some(12));
    }

    #[test]
    fn probe_does_not_disturb_recency() {
        let mut tlb = TranslationCache::new(PolicyKind::Lru);
        for page in 0..TLB_ENTRIES as u32 {
            tlb.insert(0, page, page);
        }
        // A probe of page 0 must not refresh it.
        assert!(tlb.probe(0, 0).is_some());
        tlb.insert(0, 100, 100);
        assert_eq!(tlb.lookup(0, 0), None);
    }
}

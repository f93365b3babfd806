use parking_lot::Mutex;
use tracing::debug;

use crate::addr::{AddressMode, VirtualAddress, physical_address};
use crate::base::{FRAME_COUNT, FRAMES_PER_SLOT, FrameNumber, SEGMENT_SLOTS};
use crate::error::Result;
use crate::memory::{FrameGrant, FramePool};
use crate::policy::PolicyKind;
use crate::segment::SegmentDirectory;
use crate::stats::Statistics;
use crate::store::BackingStore;
use crate::table::PageTable;
use crate::tlb::TranslationCache;

/// Whether cache and page table are searched one after the other or by
/// two concurrent scans per address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    Synchronous,
    Concurrent,
}

/// Which level of the hierarchy satisfied a translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    CacheHit,
    TableHit,
    Fault,
}

/// One committed translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub address: VirtualAddress,
    pub physical: u32,
    pub value: i8,
    pub outcome: Outcome,
}

enum Lookup {
    CacheHit(FrameNumber),
    TableHit(FrameNumber),
    Miss,
}

/// The mutable translation structures, owned as one value and threaded
/// through the pipeline rather than living as process globals.
struct TranslatorState {
    tlb: TranslationCache,
    tables: Vec<PageTable>,
    pool: FramePool,
    directory: Option<SegmentDirectory>,
    stats: Statistics,
}

/// Drives the cache -> table -> fault sequence per address and updates
/// the counters.
pub struct Translator {
    state: TranslatorState,
    store: BackingStore,
    address_mode: AddressMode,
    lookup_mode: LookupMode,
}

impl Translator {
    pub fn new(
        policy: PolicyKind,
        address_mode: AddressMode,
        lookup_mode: LookupMode,
        store: BackingStore,
    ) -> Self {
        let (partitions, frames_per_partition, directory) = match address_mode {
            AddressMode::Flat => (1, FRAME_COUNT, None),
            AddressMode::Segmented => (
                SEGMENT_SLOTS,
                FRAMES_PER_SLOT,
                Some(SegmentDirectory::new()),
            ),
        };
        Translator {
            state: TranslatorState {
                tlb: TranslationCache::new(policy),
                tables: (0..partitions).map(|_| PageTable::new()).collect(),
                pool: FramePool::new(policy, partitions, frames_per_partition),
                directory,
                stats: Statistics::new(),
            },
            store,
            address_mode,
            lookup_mode,
        }
    }

    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    pub fn statistics(&self) -> Statistics {
        self.state.stats
    }

    /// Translate one raw address through the full pipeline.
    pub fn translate(&mut self, raw: u32) -> Result<Translation> {
        let address = VirtualAddress::decode(raw, self.address_mode);
        self.translate_address(address)
    }

    /// Translate an already-decoded address.
    pub fn translate_address(&mut self, address: VirtualAddress) -> Result<Translation> {
        let looked = match self.lookup_mode {
            LookupMode::Synchronous => self.lookup_synchronous(address),
            LookupMode::Concurrent => self.lookup_concurrent(address),
        };
        let (frame, outcome) = match looked {
            Lookup::CacheHit(frame) => {
                self.state.stats.tlb_hits += 1;
                (frame, Outcome::CacheHit)
            }
            Lookup::TableHit(frame) => {
                self.state
                    .tlb
                    .insert(address.segment, address.page, frame);
                (frame, Outcome::TableHit)
            }
            Lookup::Miss => {
                let frame = self.fault(address)?;
                self.state
                    .tlb
                    .insert(address.segment, address.page, frame);
                (frame, Outcome::Fault)
            }
        };
        self.state.stats.translated += 1;
        Ok(Translation {
            address,
            physical: physical_address(frame, address.offset),
            value: self.state.pool.byte(frame, address.offset) as i8,
            outcome,
        })
    }

    /// Page table holding the segment's pages, if the segment is resident.
    /// Flat mode has exactly one table, always resident.
    fn resident_slot(&self, address: VirtualAddress) -> Option<usize> {
        match &self.state.directory {
            None => Some(0),
            Some(directory) => directory.peek(address.segment),
        }
    }

    fn lookup_synchronous(&mut self, address: VirtualAddress) -> Lookup {
        if let Some(frame) = self.state.tlb.lookup(address.segment, address.page) {
            return Lookup::CacheHit(frame);
        }
        if let Some(slot) = self.resident_slot(address) {
            if let Some(frame) = self.state.tables[slot].lookup(address.page) {
                return Lookup::TableHit(frame);
            }
        }
        Lookup::Miss
    }

    /// Cache scan and table scan as two joined threads. Each computes its
    /// result task-locally and merges into the shared slot under the
    /// mutex; the cache result wins regardless of completion order, so
    /// the table task checks the cache flag before writing. The scanned
    /// structures are borrowed read-only - all metadata updates happen
    /// after the join.
    fn lookup_concurrent(&mut self, address: VirtualAddress) -> Lookup {
        #[derive(Default)]
        struct Merged {
            frame: Option<FrameNumber>,
            cache_slot: Option<usize>,
        }

        let tlb = &self.state.tlb;
        let table = self.resident_slot(address).map(|s| &self.state.tables[s]);
        let shared = Mutex::new(Merged::default());

        std::thread::scope(|scope| {
            scope.spawn(|| {
                if let Some((slot, frame)) = tlb.probe(address.segment, address.page) {
                    let mut merged = shared.lock();
                    merged.frame = Some(frame);
                    merged.cache_slot = Some(slot);
                }
            });
            scope.spawn(|| {
                if let Some(frame) = table.and_then(|t| t.lookup(address.page)) {
                    let mut merged = shared.lock();
                    if merged.cache_slot.is_none() {
                        merged.frame = Some(frame);
                    }
                }
            });
        });

        let merged = shared.into_inner();
        match (merged.cache_slot, merged.frame) {
            (Some(slot), Some(frame)) => {
                self.state.tlb.touch(slot);
                Lookup::CacheHit(frame)
            }
            (None, Some(frame)) => Lookup::TableHit(frame),
            _ => Lookup::Miss,
        }
    }

    /// The fault path: resolve the segment slot, take a frame (evicting
    /// if the partition is full), fill it from the backing store and map
    /// the page. Exactly one whole-page read per fault.
    fn fault(&mut self, address: VirtualAddress) -> Result<FrameNumber> {
        let slot = match self.state.directory.as_mut() {
            None => 0,
            Some(directory) => {
                let resolution = directory.resolve(address.segment);
                if resolution.fault {
                    self.state.stats.segmentation_faults += 1;
                }
                if let Some(evicted) = resolution.evicted {
                    // Lossy teardown: the evicted segment's pages are
                    // discarded, not written back.
                    self.state.tables[resolution.slot].clear();
                    self.state.pool.reclaim_partition(resolution.slot);
                    self.state.tlb.invalidate_segment(evicted);
                }
                resolution.slot
            }
        };

        let grant = self.state.pool.allocate(slot);
        let frame = grant.frame();
        if let FrameGrant::Evicted(frame) = grant {
            // Invalidate the old owner before the content is overwritten,
            // in table and cache both.
            if let Some(page) = self.state.tables[slot].invalidate_frame(frame) {
                debug!(page, frame, "evicted resident page");
            }
            self.state.tlb.invalidate_frame(frame);
        }

        self.state.stats.page_faults += 1;
        debug!(
            segment = address.segment,
            page = address.page,
            frame,
            "page fault"
        );
        self.store
            .read_page(address.page, self.state.pool.content_mut(frame))?;
        self.state.tables[slot].map(address.page, frame);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{PAGE_COUNT, PAGE_SIZE};
    use std::io::Write;

    /// Store fixture: page p is filled with byte p.
    fn fixture(name: &str) -> BackingStore {
        let path = std::env::temp_dir().join(name);
        let mut file = std::fs::File::create(&path).expect("failed to create fixture");
        for page in 0..PAGE_COUNT {
            file.write_all(&[page as u8; PAGE_SIZE])
                .expect("failed to write fixture");
        }
        BackingStore::open(path).expect("failed to open fixture")
    }

    fn flat(name: &str, policy: PolicyKind, lookup: LookupMode) -> Translator {
        Translator::new(policy, AddressMode::Flat, lookup, fixture(name))
    }

    #[test]
    fn four_address_lru_scenario() {
        let mut t = flat(
            "vmsim-tr-scenario.bin",
            PolicyKind::Lru,
            LookupMode::Synchronous,
        );

        let first = t.translate(0).expect("translate failed");
        assert_eq!(first.outcome, Outcome::Fault);
        assert_eq!(first.physical, 0);
        assert_eq!(first.value, 0);

        let second = t.translate(0).expect("translate failed");
        assert_eq!(second.outcome, Outcome::CacheHit);

        let third = t.translate(256).expect("translate failed");
        assert_eq!(third.outcome, Outcome::Fault);
        assert_eq!(third.physical, 1 * PAGE_SIZE as u32);
        assert_eq!(third.value, 1);

        let fourth = t.translate(511).expect("translate failed");
        assert_eq!(fourth.outcome, Outcome::CacheHit);
        assert_eq!(fourth.physical, 1 * PAGE_SIZE as u32 + 255);
        assert_eq!(fourth.value, 1);

        let stats = t.statistics();
        assert_eq!(stats.translated, 4);
        assert_eq!(stats.page_faults, 2);
        assert_eq!(stats.tlb_hits, 2);
    }

    #[test]
    fn table_hit_after_cache_eviction() {
        let mut t = flat(
            "vmsim-tr-tablehit.bin",
            PolicyKind::Lru,
            LookupMode::Synchronous,
        );
        // Fault in more pages than the cache holds; page 0 stays mapped
        // in the table but has long left the 16-entry cache.
        for page in 0..32u32 {
            t.translate(page * PAGE_SIZE as u32).expect("translate failed");
        }
        let again = t.translate(0).expect("translate failed");
        assert_eq!(again.outcome, Outcome::TableHit);
        assert_eq!(t.statistics().page_faults, 32);
    }

    #[test]
    fn frame_eviction_unmaps_the_victim_page() {
        let mut t = flat(
            "vmsim-tr-evict.bin",
            PolicyKind::Lru,
            LookupMode::Synchronous,
        );
        // Fill all frames.
        for page in 0..FRAME_COUNT as u32 {
            t.translate(page * PAGE_SIZE as u32).expect("translate failed");
        }
        assert_eq!(t.statistics().page_faults, FRAME_COUNT as u64);

        // One more page steals the oldest frame (frame 0, owned by page 0).
        let overflow = t
            .translate(FRAME_COUNT as u32 * PAGE_SIZE as u32)
            .expect("translate failed");
        assert_eq!(overflow.outcome, Outcome::Fault);
        assert_eq!(overflow.physical, 0);
        assert_eq!(overflow.value, FRAME_COUNT as i8);

        // Page 0 was unmapped, so touching it faults again.
        let refault = t.translate(0).expect("translate failed");
        assert_eq!(refault.outcome, Outcome::Fault);
        assert_eq!(t.statistics().page_faults, FRAME_COUNT as u64 + 2);
    }

    #[test]
    fn values_are_signed_bytes() {
        let mut t = flat(
            "vmsim-tr-signed.bin",
            PolicyKind::Lru,
            LookupMode::Synchronous,
        );
        let high = t.translate(200 * PAGE_SIZE as u32).expect("translate failed");
        assert_eq!(high.value, 200u8 as i8);
        assert!(high.value < 0);
    }

    #[test]
    fn concurrent_lookup_matches_synchronous() {
        let mut sync = flat(
            "vmsim-tr-sync.bin",
            PolicyKind::Lru,
            LookupMode::Synchronous,
        );
        let mut conc = flat(
            "vmsim-tr-conc.bin",
            PolicyKind::Lru,
            LookupMode::Concurrent,
        );
        // A stream with faults, cache hits, table hits and frame reuse.
        let mut stream: Vec<u32> = (0..40u32).map(|p| p * PAGE_SIZE as u32 + p).collect();
        stream.extend([0, 0, 17 * PAGE_SIZE as u32, 39 * PAGE_SIZE as u32 + 7, 0]);
        for raw in stream {
            let a = sync.translate(raw).expect("sync translate failed");
            let b = conc.translate(raw).expect("concurrent translate failed");
            assert_eq!(a, b);
        }
        assert_eq!(sync.statistics(), conc.statistics());
    }

    #[test]
    fn segments_do_not_share_mappings() {
        let store = fixture("vmsim-tr-seg.bin");
        let mut t = Translator::new(
            PolicyKind::Lru,
            AddressMode::Segmented,
            LookupMode::Synchronous,
            store,
        );

        // Page 0 of segment 0, then page 0 of segment 1: distinct frames,
        // no cache hit for the second despite the equal page number.
        let a = t.translate(0).expect("translate failed");
        let b = t
            .translate(PAGE_SIZE as u32 * PAGE_COUNT as u32)
            .expect("translate failed");
        assert_eq!(a.outcome, Outcome::Fault);
        assert_eq!(b.outcome, Outcome::Fault);
        assert_ne!(a.physical, b.physical);

        let stats = t.statistics();
        assert_eq!(stats.translated, 2);
        assert_eq!(stats.page_faults, 2);
        assert_eq!(stats.segmentation_faults, 2);
        assert_eq!(stats.tlb_hits, 0);

        // Re-access of each stays bound: no further segmentation faults.
        t.translate(0).expect("translate failed");
        t.translate(PAGE_SIZE as u32 * PAGE_COUNT as u32)
            .expect("translate failed");
        let stats = t.statistics();
        assert_eq!(stats.segmentation_faults, 2);
        assert_eq!(stats.tlb_hits, 2);
    }

    #[test]
    fn slot_reassignment_is_a_lossy_eviction() {
        let store = fixture("vmsim-tr-steal.bin");
        let mut t = Translator::new(
            PolicyKind::Lru,
            AddressMode::Segmented,
            LookupMode::Synchronous,
            store,
        );

        // Segment 1 and segment 5 collide on directory slot 1. Decoded
        // addresses never produce segment 5, but the directory contract
        // is total, so drive it with a hand-built address.
        let seg1 = VirtualAddress::decode(PAGE_SIZE as u32 * PAGE_COUNT as u32, AddressMode::Segmented);
        assert_eq!(seg1.segment, 1);
        let seg5 = VirtualAddress { segment: 5, ..seg1 };

        t.translate_address(seg1).expect("translate failed");
        let stolen = t.translate_address(seg5).expect("translate failed");
        assert_eq!(stolen.outcome, Outcome::Fault);

        // Segment 1 lost its slot: its page faults afresh and the slot is
        // stolen back, with a segmentation fault each way.
        let back = t.translate_address(seg1).expect("translate failed");
        assert_eq!(back.outcome, Outcome::Fault);

        let stats = t.statistics();
        assert_eq!(stats.page_faults, 3);
        assert_eq!(stats.segmentation_faults, 3);
        assert_eq!(stats.tlb_hits, 0);
    }
}

use tracing::debug;

use crate::base::{SEGMENT_SLOTS, SegmentNumber};

/// Outcome of binding a segment to a directory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub slot: usize,
    /// True whenever the slot had to be (re)bound.
    pub fault: bool,
    /// Segment that lost the slot, if it was occupied. The caller tears
    /// down its page table, frames and cache entries; the previous
    /// content is discarded, not written back.
    pub evicted: Option<SegmentNumber>,
}

/// Maps segment numbers onto a small fixed set of memory-resident slots.
/// Placement is by modulus, as many segments as slots may be resident at
/// once, and stealing an occupied slot is a lossy but legal eviction.
pub struct SegmentDirectory {
    residents: [Option<SegmentNumber>; SEGMENT_SLOTS],
}

impl SegmentDirectory {
    pub fn new() -> Self {
        SegmentDirectory {
            residents: [None; SEGMENT_SLOTS],
        }
    }

    /// Slot the segment would occupy.
    fn slot_of(segment: SegmentNumber) -> usize {
        segment as usize % SEGMENT_SLOTS
    }

    /// The segment's slot if it is currently resident; no side effects.
    /// Lookups use this - only the fault path binds slots.
    pub fn peek(&self, segment: SegmentNumber) -> Option<usize> {
        let slot = Self::slot_of(segment);
        (self.residents[slot] == Some(segment)).then_some(slot)
    }

    /// Bind the segment to its slot, evicting the current resident if it
    /// is a different segment.
    pub fn resolve(&mut self, segment: SegmentNumber) -> Resolution {
        let slot = Self::slot_of(segment);
        match self.residents[slot] {
            Some(resident) if resident == segment => Resolution {
                slot,
                fault: false,
                evicted: None,
            },
            occupant => {
                if let Some(evicted) = occupant {
                    debug!(segment, evicted, slot, "segment slot reassigned");
                }
                self.residents[slot] = Some(segment);
                Resolution {
                    slot,
                    fault: true,
                    evicted: occupant,
                }
            }
        }
    }
}

impl Default for SegmentDirectory {
    fn default() -> Self {
        SegmentDirectory::new()
    }
}

use crate::base::{PAGE_COUNT, PAGE_SIZE, SEGMENT_COUNT};
use crate::base::{FrameNumber, PageNumber, SegmentNumber};

/// How the raw address is split. `Flat` leaves the segment field at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Flat,
    Segmented,
}

/// A decoded virtual address. Derived once from the raw integer, never
/// mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub raw: u32,
    pub segment: SegmentNumber,
    pub page: PageNumber,
    pub offset: u32,
}

impl VirtualAddress {
    /// Split a raw address into {segment, page, offset} by fixed division
    /// and mask. Total: every non-negative integer decodes.
    pub fn decode(raw: u32, mode: AddressMode) -> Self {
        let page = (raw / PAGE_SIZE as u32) % PAGE_COUNT as u32;
        let offset = raw % PAGE_SIZE as u32;
        let segment = match mode {
            AddressMode::Flat => 0,
            AddressMode::Segmented => {
                (raw / (PAGE_SIZE as u32 * PAGE_COUNT as u32)) % SEGMENT_COUNT as u32
            }
        };
        VirtualAddress {
            raw,
            segment,
            page,
            offset,
        }
    }
}

/// Physical address of a byte inside a frame
pub fn physical_address(frame: FrameNumber, offset: u32) -> u32 {
    frame * PAGE_SIZE as u32 + offset
}

use crate::base::{FrameNumber, PAGE_COUNT, PageNumber};

/// Direct-mapped page table: one entry per virtual page, indexed by page
/// number. `None` means unmapped. Capacity covers the whole virtual page
/// space, so insertion never overflows; entries are reclaimed only when
/// their frame is evicted or the owning segment slot is torn down.
pub struct PageTable {
    frames: Vec<Option<FrameNumber>>,
}

impl PageTable {
    pub fn new() -> Self {
        PageTable {
            frames: vec![None; PAGE_COUNT],
        }
    }

    pub fn lookup(&self, page: PageNumber) -> Option<FrameNumber> {
        self.frames[page as usize]
    }

    pub fn map(&mut self, page: PageNumber, frame: FrameNumber) {
        self.frames[page as usize] = Some(frame);
    }

    /// Unmap whichever page owns `frame`, returning it. Must run before
    /// the frame's content is overwritten - otherwise two pages would
    /// alias one frame.
    pub fn invalidate_frame(&mut self, frame: FrameNumber) -> Option<PageNumber> {
        for (page, mapped) in self.frames.iter_mut().enumerate() {
            if *mapped == Some(frame) {
                *mapped = None;
                return Some(page as PageNumber);
            }
        }
        None
    }

    /// Unmap everything. Used when a segment slot is reassigned and all
    /// of its resident pages become stale.
    pub fn clear(&mut self) {
        self.frames.fill(None);
    }
}

impl Default for PageTable {
    fn default() -> Self {
        PageTable::new()
    }
}

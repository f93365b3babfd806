/// Page size in bytes - also the frame size and the backing-store stride
pub const PAGE_SIZE: usize = 256;

/// Virtual pages per address space (per segment in segmented mode)
pub const PAGE_COUNT: usize = 256;

/// Translation cache capacity
pub const TLB_ENTRIES: usize = 16;

/// Physical frames, unsegmented mode
pub const FRAME_COUNT: usize = 128;

/// Segment directory slots, segmented mode
pub const SEGMENT_SLOTS: usize = 4;

/// Physical frames owned by each segment slot, segmented mode
pub const FRAMES_PER_SLOT: usize = 128;

/// Addressable segments (segment field of the virtual address)
pub const SEGMENT_COUNT: usize = 4;

/// Virtual page number
pub type PageNumber = u32;

/// Physical frame number
pub type FrameNumber = u32;

/// Segment number decoded from the virtual address
pub type SegmentNumber = u32;

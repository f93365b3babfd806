use tracing::debug;

use crate::base::{FrameNumber, PAGE_SIZE};
use crate::policy::{EvictionPolicy, PolicyKind};

/// One physical frame: a page-sized buffer, overwritten wholesale on a
/// fault, never partially.
struct Frame {
    content: Box<[u8; PAGE_SIZE]>,
    occupied: bool,
}

impl Frame {
    fn new() -> Self {
        Frame {
            content: Box::new([0; PAGE_SIZE]),
            occupied: false,
        }
    }
}

/// Outcome of a frame allocation. `Evicted` means the frame was taken
/// from another page; the caller must invalidate the old owner's table
/// and cache entries before refilling the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameGrant {
    Fresh(FrameNumber),
    Evicted(FrameNumber),
}

impl FrameGrant {
    pub fn frame(&self) -> FrameNumber {
        match *self {
            FrameGrant::Fresh(frame) | FrameGrant::Evicted(frame) => frame,
        }
    }
}

struct Partition {
    base: usize,
    len: usize,
    policy: Box<dyn EvictionPolicy>,
}

/// The fixed set of physical frames, split into one partition per segment
/// slot (a single partition in flat mode). Each partition carries its own
/// eviction-policy instance; free frames are always preferred over
/// eviction.
pub struct FramePool {
    frames: Vec<Frame>,
    partitions: Vec<Partition>,
    kind: PolicyKind,
}

impl FramePool {
    pub fn new(kind: PolicyKind, partitions: usize, frames_per_partition: usize) -> Self {
        let frames = (0..partitions * frames_per_partition)
            .map(|_| Frame::new())
            .collect();
        let partitions = (0..partitions)
            .map(|p| Partition {
                base: p * frames_per_partition,
                len: frames_per_partition,
                policy: kind.build(frames_per_partition),
            })
            .collect();
        FramePool {
            frames,
            partitions,
            kind,
        }
    }

    /// Grant a frame from `partition`: the first free frame if one
    /// exists, otherwise the policy victim.
    pub fn allocate(&mut self, partition: usize) -> FrameGrant {
        let part = &mut self.partitions[partition];
        for local in 0..part.len {
            let global = part.base + local;
            if !self.frames[global].occupied {
                self.frames[global].occupied = true;
                part.policy.record_access(local);
                return FrameGrant::Fresh(global as FrameNumber);
            }
        }
        let local = part.policy.choose_victim();
        part.policy.record_access(local);
        let global = part.base + local;
        debug!(frame = global, "frame eviction");
        FrameGrant::Evicted(global as FrameNumber)
    }

    /// Free every frame of `partition` and reset its policy state. Used
    /// when the owning segment slot is reassigned; the previous content
    /// is discarded, not written back.
    pub fn reclaim_partition(&mut self, partition: usize) {
        let part = &mut self.partitions[partition];
        for local in 0..part.len {
            self.frames[part.base + local].occupied = false;
        }
        part.policy = self.kind.build(part.len);
    }

    /// Whole-frame buffer for the fault path to fill.
    pub fn content_mut(&mut self, frame: FrameNumber) -> &mut [u8; PAGE_SIZE] {
        &mut self.frames[frame as usize].content
    }

    pub fn byte(&self, frame: FrameNumber, offset: u32) -> u8 {
        self.frames[frame as usize].content[offset as usize]
    }
}

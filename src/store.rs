use std::fs::File;
use std::os::unix::fs::FileExt;
use std::path::Path;

use crate::base::{PAGE_SIZE, PageNumber};
use crate::error::{Error, Result};

/// Read-only page source: a flat file of concatenated PAGE_SIZE pages,
/// addressed by `page * PAGE_SIZE`. Never written by the core.
pub struct BackingStore {
    file: File,
    len: u64,
}

impl BackingStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        Ok(BackingStore { file, len })
    }

    /// Number of whole pages the store holds.
    pub fn page_count(&self) -> u64 {
        self.len / PAGE_SIZE as u64
    }

    /// Read one whole page into `buf`. A page beyond the store's extent
    /// is an integrity fault, not undefined content.
    pub fn read_page(&self, page: PageNumber, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        let offset = page as u64 * PAGE_SIZE as u64;
        if offset + PAGE_SIZE as u64 > self.len {
            return Err(Error::Store(format!(
                "store of {} pages ends before page {}",
                self.page_count(),
                page
            )));
        }
        self.file.read_exact_at(buf, offset)?;
        Ok(())
    }
}

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use vmsim::Config;

pub const PAGE_SIZE: usize = 256;

/// TestRun manages an isolated working directory with a backing store
/// and an address stream for end-to-end translation runs.
pub struct TestRun {
    dir: PathBuf,
}

impl TestRun {
    /// Create a fixture directory with a 256-page backing store where
    /// page p is filled with byte p.
    pub fn new(name: &str) -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let dir = PathBuf::from(format!("/tmp/vmsim-test-{}-{}", name, now.as_nanos()));
        fs::create_dir_all(&dir).expect("failed to create temp dir");

        let mut store =
            File::create(dir.join("BACKING_STORE.bin")).expect("failed to create backing store");
        for page in 0..256usize {
            store
                .write_all(&[page as u8; PAGE_SIZE])
                .expect("failed to fill backing store");
        }

        TestRun { dir }
    }

    /// Write the address stream, one decimal address per line.
    pub fn write_addresses(&self, addresses: &[u32]) {
        let lines: String = addresses.iter().map(|a| format!("{}\n", a)).collect();
        fs::write(self.dir.join("addresses.txt"), lines).expect("failed to write address stream");
    }

    /// Config pointing every collaborator into the fixture directory.
    pub fn config(&self) -> Config {
        Config {
            addresses: self.dir.join("addresses.txt"),
            backing_store: self.dir.join("BACKING_STORE.bin"),
            result: self.dir.join("result.txt"),
            ..Config::default()
        }
    }

    pub fn result_text(&self) -> String {
        fs::read_to_string(self.dir.join("result.txt")).expect("failed to read result file")
    }
}

impl Drop for TestRun {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

use std::path::PathBuf;

use crate::addr::AddressMode;
use crate::error::{Error, Result};
use crate::policy::PolicyKind;
use crate::translator::LookupMode;

/// Default address-stream file, the only overridable name.
pub const ADDRESSES_DEFAULT: &str = "addresses.txt";
/// Backing-store file, fixed.
pub const BACKING_STORE_DEFAULT: &str = "BACKING_STORE.bin";
/// Result file, fixed.
pub const RESULT_DEFAULT: &str = "result.txt";

pub struct Config {
    pub addresses: PathBuf,
    pub backing_store: PathBuf,
    pub result: PathBuf,
    pub policy: PolicyKind,
    pub address_mode: AddressMode,
    pub lookup_mode: LookupMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addresses: PathBuf::from(ADDRESSES_DEFAULT),
            backing_store: PathBuf::from(BACKING_STORE_DEFAULT),
            result: PathBuf::from(RESULT_DEFAULT),
            policy: PolicyKind::Lru,
            address_mode: AddressMode::Flat,
            lookup_mode: LookupMode::Synchronous,
        }
    }
}

impl Config {
    pub fn from_args() -> Result<Self> {
        Self::parse(std::env::args().skip(1))
    }

    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut config = Config::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--policy" => {
                    let value = args
                        .next()
                        .ok_or_else(|| Error::Parse("--policy requires a value".into()))?;
                    config.policy = match value.as_str() {
                        "lru" => PolicyKind::Lru,
                        "fifo" => PolicyKind::Fifo,
                        "aging" => PolicyKind::Aging,
                        other => {
                            return Err(Error::Parse(format!("unknown policy: {}", other)));
                        }
                    };
                }
                "--segmented" => config.address_mode = AddressMode::Segmented,
                "--concurrent" => config.lookup_mode = LookupMode::Concurrent,
                flag if flag.starts_with("--") => {
                    return Err(Error::Parse(format!("unknown flag: {}", flag)));
                }
                positional => config.addresses = PathBuf::from(positional),
            }
        }
        Ok(config)
    }
}

use std::fs::File;
use std::io::{BufRead, BufReader};

use tracing::{Level, info, span};
use ulid::Ulid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::sink::ResultSink;
use crate::stats::Statistics;
use crate::store::BackingStore;
use crate::translator::Translator;

/// Consume the address stream to completion: translate every address,
/// write one record each, then the summary.
pub fn run(config: &Config) -> Result<Statistics> {
    let run_id = Ulid::new();
    let span = span!(Level::INFO, "run", run_id = %run_id, policy = config.policy.name());
    let _enter = span.enter();

    let addresses = File::open(&config.addresses)
        .map_err(|_| Error::NotFound(config.addresses.display().to_string()))?;
    let store = BackingStore::open(&config.backing_store)?;
    let mut translator = Translator::new(
        config.policy,
        config.address_mode,
        config.lookup_mode,
        store,
    );
    let mut sink = ResultSink::create(&config.result, config.address_mode)?;

    info!(addresses = %config.addresses.display(), "translating address stream");

    for line in BufReader::new(addresses).lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw: u32 = line
            .parse()
            .map_err(|_| Error::Parse(format!("invalid address line: {:?}", line)))?;
        let translation = translator.translate(raw)?;
        sink.record(&translation)?;
    }

    let stats = translator.statistics();
    sink.summary(&stats)?;
    sink.finish()?;

    info!(
        translated = stats.translated,
        page_faults = stats.page_faults,
        segmentation_faults = stats.segmentation_faults,
        tlb_hits = stats.tlb_hits,
        "address stream consumed"
    );
    Ok(stats)
}

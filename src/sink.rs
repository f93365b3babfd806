use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::addr::AddressMode;
use crate::error::Result;
use crate::stats::Statistics;
use crate::translator::Translation;

/// Buffered writer for the result file: one record per translated
/// address, one summary block at end of stream.
pub struct ResultSink {
    out: BufWriter<File>,
    mode: AddressMode,
}

impl ResultSink {
    pub fn create<P: AsRef<Path>>(path: P, mode: AddressMode) -> Result<Self> {
        let file = File::create(path)?;
        Ok(ResultSink {
            out: BufWriter::new(file),
            mode,
        })
    }

    pub fn record(&mut self, translation: &Translation) -> Result<()> {
        let address = &translation.address;
        match self.mode {
            AddressMode::Flat => writeln!(
                self.out,
                "Virtual address: {} Physical address: {} Value: {}",
                address.raw, translation.physical, translation.value
            )?,
            AddressMode::Segmented => writeln!(
                self.out,
                "Virtual address: {}-{} Physical address: {}-{} Value: {}",
                address.segment,
                address.raw,
                address.segment,
                translation.physical,
                translation.value
            )?,
        }
        Ok(())
    }

    pub fn summary(&mut self, stats: &Statistics) -> Result<()> {
        writeln!(
            self.out,
            "Number of Translated Addresses = {}",
            stats.translated
        )?;
        if self.mode == AddressMode::Segmented {
            writeln!(self.out, "Segmentation Faults = {}", stats.segmentation_faults)?;
            writeln!(
                self.out,
                "Segmentation Fault Rate = {}",
                format_rate(stats.segmentation_fault_rate())
            )?;
        }
        writeln!(self.out, "Page Faults = {}", stats.page_faults)?;
        writeln!(
            self.out,
            "Page Fault Rate = {}",
            format_rate(stats.page_fault_rate())
        )?;
        writeln!(self.out, "TLB Hits = {}", stats.tlb_hits)?;
        writeln!(
            self.out,
            "TLB Hit Rate = {}",
            format_rate(stats.tlb_hit_rate())
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(rate) => format!("{:.3}", rate),
        None => "undefined (no translations performed)".to_string(),
    }
}

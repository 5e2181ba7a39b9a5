//! Results ledger: one `date,security,measure,value` line per result.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use mktstructure_core::config::LedgerConfig;
use mktstructure_core::{MeasureResult, Result};

pub struct LedgerWriter {
    out: BufWriter<File>,
    written: usize,
}

impl LedgerWriter {
    /// Open the ledger, appending to or truncating an existing file.
    pub fn open(path: &Path, append: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Self::open(&config.out, config.append)
    }

    /// Write rows in the given order.
    pub fn write_all(&mut self, results: &[MeasureResult]) -> Result<()> {
        for result in results {
            writeln!(self.out, "{}", result.to_line())?;
        }
        self.written += results.len();
        Ok(())
    }

    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush buffered lines.
    pub fn finish(mut self) -> Result<usize> {
        self.out.flush()?;
        Ok(self.written)
    }
}

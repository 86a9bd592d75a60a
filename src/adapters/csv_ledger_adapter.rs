//! Append-only CSV trade ledger.
//!
//! Columns: strategy, symbol, entry_price, exit_price, pnl_pct, pnl_usd, fees,
//! reason, entry_time, exit_time. The header is written only when the file
//! starts out empty, so restarts keep appending to the same ledger.
//! [`read_trades`] loads a ledger back for after-the-fact reports.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::domain::error::TraderError;
use crate::domain::position::TradeRecord;
use crate::ports::ledger_port::TradeLedgerPort;

pub struct CsvLedgerAdapter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl CsvLedgerAdapter {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TraderError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| TraderError::Ledger {
                reason: format!("failed to open {}: {}", path.display(), e),
            })?;
        let is_empty = file
            .metadata()
            .map_err(|e| TraderError::Ledger {
                reason: format!("failed to stat {}: {}", path.display(), e),
            })?
            .len()
            == 0;

        let writer = csv::WriterBuilder::new()
            .has_headers(is_empty)
            .from_writer(file);

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TradeLedgerPort for CsvLedgerAdapter {
    fn append(&mut self, record: &TradeRecord) -> Result<(), TraderError> {
        self.writer
            .serialize(record)
            .map_err(|e| TraderError::Ledger {
                reason: format!("failed to append to {}: {}", self.path.display(), e),
            })?;
        // One row per closed trade; keep the file current for outside readers.
        self.flush()
    }

    fn flush(&mut self) -> Result<(), TraderError> {
        self.writer.flush().map_err(|e| TraderError::Ledger {
            reason: format!("failed to flush {}: {}", self.path.display(), e),
        })
    }
}

/// Read every trade in a ledger file, ordered by exit time.
pub fn read_trades<P: AsRef<Path>>(path: P) -> Result<Vec<TradeRecord>, TraderError> {
    let path = path.as_ref();
    let ledger_error = |reason: String| TraderError::Ledger { reason };

    let file = File::open(path)
        .map_err(|e| ledger_error(format!("failed to read {}: {}", path.display(), e)))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut trades = Vec::new();
    for (line, result) in rdr.deserialize::<TradeRecord>().enumerate() {
        let record = result.map_err(|e| {
            ledger_error(format!("{} row {}: {}", path.display(), line + 1, e))
        })?;
        trades.push(record);
    }

    trades.sort_by_key(|t| t.exit_time);
    Ok(trades)
}

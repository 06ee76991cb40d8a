//! CSV tick files: `symbol,date,time,price,size,exchange,kind`.
//!
//! `kind` is `T` for a trade print, `B` for a bid quote and `A` for an ask
//! quote. Lines starting with `#` are comments.

use std::io::Read;
use std::path::Path;

use gauntlet::{Price, Tick, TickSource};
use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct TickRecord {
    symbol: String,
    date: u32,
    time: u32,
    price: String,
    size: u64,
    #[serde(default)]
    exchange: String,
    kind: String,
}

impl TickRecord {
    fn into_tick(self) -> std::result::Result<Tick, String> {
        let price: Price = self.price.parse().map_err(|e| format!("{e}"))?;
        let tick = match self.kind.as_str() {
            "T" | "t" => Tick::trade(&self.symbol, self.date, self.time, price, self.size, ""),
            "B" | "b" => Tick::bid(&self.symbol, self.date, self.time, price, self.size),
            "A" | "a" => Tick::ask(&self.symbol, self.date, self.time, price, self.size),
            other => return Err(format!("unknown tick kind {other:?}")),
        };
        Ok(tick.on(&self.exchange))
    }
}

/// Decode ticks from CSV text; `origin` names the input in errors.
pub fn read_ticks<R: Read>(reader: R, origin: &Path) -> Result<Vec<Tick>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut ticks = Vec::new();
    let csv_error = |e: csv::Error| Error::TicksRead {
        path: origin.to_path_buf(),
        source: e,
    };
    for result in rdr.records() {
        let record = result.map_err(csv_error)?;
        let line = record.position().map_or(0, |p| p.line());
        let row: TickRecord = record.deserialize(None).map_err(csv_error)?;
        let tick = row.into_tick().map_err(|message| Error::Tick {
            path: origin.to_path_buf(),
            line,
            message,
        })?;
        ticks.push(tick);
    }
    Ok(ticks)
}

/// Load a tick file into a source named after the file.
pub fn load(path: &Path) -> Result<TickSource> {
    let file = std::fs::File::open(path).map_err(|e| Error::TicksRead {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let ticks = read_ticks(file, path)?;
    log::debug!("loaded {} ticks from {}", ticks.len(), path.display());
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(TickSource::new(name, ticks))
}

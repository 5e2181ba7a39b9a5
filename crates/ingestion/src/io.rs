//! Reading and writing delimited tick files.
//!
//! Files ending in `.gz` are transparently gzip-compressed. Empty cells are
//! read as NaN and NaN is written as an empty cell.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use csv::{StringRecord, WriterBuilder};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use mktstructure_core::frame::{
    COL_ASK_PRICE, COL_ASK_SIZE, COL_BID_PRICE, COL_BID_SIZE, COL_PRICE, COL_VOLUME,
};
use mktstructure_core::{
    format_timestamp, parse_timestamp, ClassifiedTrade, Error, Frame, Result, Tick, TickKind,
    TimestampNs,
};
use tracing::debug;

pub const COL_DATE_TIME: &str = "Date-Time";
pub const COL_TYPE: &str = "Type";
pub const COL_GMT_OFFSET: &str = "GMT Offset";

fn is_gzip(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("gz")
}

/// Open a CSV reader, decompressing if needed.
pub fn open_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>> {
    let file = BufReader::new(File::open(path)?);
    let inner: Box<dyn Read> = if is_gzip(path) {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };
    Ok(csv::ReaderBuilder::new().flexible(false).from_reader(inner))
}

/// Output file, compressed when the path ends in `.gz`.
pub enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Sink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(if is_gzip(path) {
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            Sink::Plain(file)
        })
    }

    /// Flush and, for gzip, write the trailer.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Sink::Plain(mut w) => w.flush(),
            Sink::Gzip(enc) => enc.finish()?.flush(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// Open a CSV writer, compressing if needed.
pub fn open_writer(path: &Path) -> Result<csv::Writer<Sink>> {
    Ok(WriterBuilder::new().from_writer(Sink::create(path)?))
}

/// Flush a CSV writer and finish its sink.
pub fn close_writer(writer: csv::Writer<Sink>) -> Result<()> {
    let sink = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    sink.finish()?;
    Ok(())
}

/// Parse a numeric cell; empty means NaN.
pub fn parse_cell(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        Some(f64::NAN)
    } else {
        s.parse().ok()
    }
}

fn format_cell(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}

/// Read all records of a file verbatim.
pub fn read_records(path: &Path) -> Result<(StringRecord, Vec<StringRecord>)> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(path = %path.display(), rows = records.len(), "read records");
    Ok((headers, records))
}

/// Write records verbatim.
pub fn write_records(path: &Path, headers: &StringRecord, records: &[StringRecord]) -> Result<()> {
    let mut writer = open_writer(path)?;
    writer.write_record(headers)?;
    for record in records {
        writer.write_record(record)?;
    }
    close_writer(writer)
}

/// Raw ticks of one security-day plus the file's GMT offset in hours.
#[derive(Debug, Clone, Default)]
pub struct TickFile {
    pub ticks: Vec<Tick>,
    /// `GMT Offset` of the first row, if the column exists.
    pub gmt_offset_hours: Option<f64>,
}

/// Read a raw tick file.
///
/// `Date-Time` and `Type` are required. Rows whose type is neither `Trade`
/// nor `Quote` are skipped; absent numeric columns read as NaN.
pub fn read_ticks(path: &Path) -> Result<TickFile> {
    let mut reader = open_reader(path)?;
    let headers = reader.headers()?.clone();
    let find = |name: &str| headers.iter().position(|h| h == name);

    let ts_col = find(COL_DATE_TIME)
        .ok_or_else(|| Error::data(format!("{}: no '{COL_DATE_TIME}' column", path.display())))?;
    let type_col = find(COL_TYPE)
        .ok_or_else(|| Error::data(format!("{}: no '{COL_TYPE}' column", path.display())))?;
    let numeric = [
        COL_PRICE,
        COL_VOLUME,
        COL_BID_PRICE,
        COL_ASK_PRICE,
        COL_BID_SIZE,
        COL_ASK_SIZE,
    ]
    .map(find);
    let offset_col = find(COL_GMT_OFFSET);

    let mut out = TickFile::default();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let Some(kind) = record.get(type_col).and_then(TickKind::parse) else {
            skipped += 1;
            continue;
        };
        let ts_ns = parse_timestamp(record.get(ts_col).unwrap_or_default())?;
        let mut values = [f64::NAN; 6];
        for (slot, col) in values.iter_mut().zip(numeric) {
            if let Some(col) = col {
                let cell = record.get(col).unwrap_or_default();
                *slot = parse_cell(cell).ok_or_else(|| {
                    Error::data(format!("{} row {}: bad number '{cell}'", path.display(), row + 1))
                })?;
            }
        }
        if out.gmt_offset_hours.is_none() {
            out.gmt_offset_hours = offset_col
                .and_then(|c| record.get(c))
                .and_then(parse_cell)
                .filter(|v| !v.is_nan());
        }
        let [price, volume, bid_px, ask_px, bid_sz, ask_sz] = values;
        out.ticks.push(Tick {
            ts_ns,
            kind,
            price,
            volume,
            bid_px,
            ask_px,
            bid_sz,
            ask_sz,
        });
    }

    if skipped > 0 {
        debug!(path = %path.display(), skipped, "skipped rows of other types");
    }
    Ok(out)
}

/// Write a frame with its index as the `Date-Time` column.
pub fn write_frame(path: &Path, frame: &Frame) -> Result<()> {
    let mut writer = open_writer(path)?;
    let mut header = vec![COL_DATE_TIME];
    header.extend(frame.columns());
    writer.write_record(&header)?;

    let columns: Vec<&[f64]> = frame.columns().filter_map(|name| frame.column(name)).collect();
    for (row, &ts_ns) in frame.index().iter().enumerate() {
        let mut record = Vec::with_capacity(columns.len() + 1);
        record.push(format_timestamp(ts_ns));
        record.extend(columns.iter().map(|col| format_cell(col[row])));
        writer.write_record(&record)?;
    }
    close_writer(writer)
}

/// Write classified trades with the signed-trade column set.
pub fn write_signed_trades(path: &Path, trades: &[ClassifiedTrade]) -> Result<()> {
    write_frame(path, &Frame::from_classified(trades))
}

/// Write the quote records among `ticks`.
pub fn write_quotes(path: &Path, ticks: &[Tick]) -> Result<()> {
    write_frame(path, &Frame::from_quotes(ticks))
}

/// Load a file into a `Frame`.
///
/// The `Date-Time` column becomes the index. Every other column is kept if
/// all of its non-empty cells are numbers; text columns are dropped.
pub fn read_frame(path: &Path) -> Result<Frame> {
    let (headers, records) = read_records(path)?;
    let ts_col = headers
        .iter()
        .position(|h| h == COL_DATE_TIME)
        .ok_or_else(|| Error::data(format!("{}: no '{COL_DATE_TIME}' column", path.display())))?;

    let index = records
        .iter()
        .map(|r| parse_timestamp(r.get(ts_col).unwrap_or_default()))
        .collect::<Result<Vec<TimestampNs>>>()?;

    let mut frame = Frame::new(index);
    for (col, name) in headers.iter().enumerate() {
        if col == ts_col {
            continue;
        }
        let values: Option<Vec<f64>> = records
            .iter()
            .map(|r| parse_cell(r.get(col).unwrap_or_default()))
            .collect();
        match values {
            Some(values) => frame.insert(name, values)?,
            None => debug!(path = %path.display(), column = name, "dropped non-numeric column"),
        }
    }
    Ok(frame)
}

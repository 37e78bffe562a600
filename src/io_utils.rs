//! I/O helpers for reading dataset files and writing reports.
//!
//! - **Data files** live at `<dataset>/<table>.csv` and default to comma
//!   delimiting unless overridden on the command line.
//! - **Encoding**: cells are decoded via `encoding_rs`, defaulting to UTF-8.
//!   Fields are decoded without BOM sniffing; malformed bytes are an error.
//! - **Readers** are flexible so ragged rows never abort a scan.
//! - **stdout**: the `-` path convention (or no path) routes report output to
//!   standard output.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DATA_FILE_EXTENSION: &str = "csv";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

/// Location of a table's data file inside a dataset directory.
pub fn table_data_path(dataset_dir: &Path, table: &str) -> std::path::PathBuf {
    dataset_dir.join(format!("{table}.{DATA_FILE_EXTENSION}"))
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(BufReader::new(file))
}

/// True when the input opens with an empty line, which yields an empty header row.
pub fn starts_with_blank_line<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    let buffered = reader.fill_buf()?;
    Ok(matches!(buffered.first(), Some(b'\n' | b'\r')))
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(BufWriter::new(std::io::stdout().lock())),
    };
    Ok(writer)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => Ok(text.into_owned()),
        None => Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        )),
    }
}

pub fn decode_record(
    record: &csv::ByteRecord,
    encoding: &'static Encoding,
) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

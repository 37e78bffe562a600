//! Single-pass row stream over one delimited data file.
//!
//! [`RowStream`] reads the header eagerly and then yields decoded data rows
//! lazily. Rows may be shorter or longer than the header.

use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;

use crate::io_utils;

pub struct RowStream<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    encoding: &'static Encoding,
    record: csv::ByteRecord,
    row_number: usize,
}

impl RowStream<BufReader<File>> {
    /// Opens a data file. A file whose first line is empty has an empty header.
    pub fn open(path: &Path, delimiter: u8, encoding: &'static Encoding) -> Result<Self> {
        let mut input = io_utils::open_input(path)?;
        let blank_header = io_utils::starts_with_blank_line(&mut input)
            .with_context(|| format!("Reading {path:?}"))?;
        let reader = io_utils::open_csv_reader(input, delimiter);
        let mut stream = Self::from_reader(reader, encoding)
            .with_context(|| format!("Reading header of {path:?}"))?;
        if blank_header {
            stream.headers.clear();
        }
        Ok(stream)
    }
}

impl<R: Read> RowStream<R> {
    pub fn from_reader(mut reader: csv::Reader<R>, encoding: &'static Encoding) -> Result<Self> {
        let headers = io_utils::reader_headers(&mut reader, encoding)?;
        Ok(Self {
            reader,
            headers,
            encoding,
            record: csv::ByteRecord::new(),
            row_number: 1,
        })
    }

    /// Header names; empty for a zero-byte file.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// 1-based record number of the most recently yielded row, counting the header as 1.
    /// A quoted field spanning several lines still counts as one record.
    pub fn row_number(&self) -> usize {
        self.row_number
    }
}

impl<R: Read> Iterator for RowStream<R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_byte_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                self.row_number += 1;
                let row_number = self.row_number;
                Some(
                    io_utils::decode_record(&self.record, self.encoding)
                        .with_context(|| format!("Decoding row {row_number}")),
                )
            }
            Err(err) => {
                self.row_number += 1;
                Some(Err(err).context(format!("Reading row {}", self.row_number)))
            }
        }
    }
}

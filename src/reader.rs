//! Row reader for artifact CSV exports.
//!
//! Files are memory-mapped and decoded with the `csv` crate. The first record
//! is the header; every following record becomes a [`RawRow`]. Records may be
//! shorter or longer than the header. Invalid UTF-8 is replaced lossily.

use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::NormalizeError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Column names of one file, in file order.
#[derive(Debug, Clone, Default)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            // first occurrence wins for duplicated column names
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }
}

/// One decoded data line: unparsed values addressed by column name.
#[derive(Debug, Clone)]
pub struct RawRow<'h> {
    header: &'h Header,
    values: Vec<String>,
    line: u64,
}

impl<'h> RawRow<'h> {
    pub fn new(header: &'h Header, values: Vec<String>, line: u64) -> Self {
        Self {
            header,
            values,
            line,
        }
    }

    /// Raw value of `column`, or `None` if the file has no such column or
    /// this record is too short to reach it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.header
            .position(column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    /// Trimmed value of `column`, treating blank cells as absent.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    /// `(column, value)` pairs in header order. Values past the end of the
    /// header have no name and are not yielded.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .names()
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Line number of this record in its file (the header is line 1).
    pub fn line(&self) -> u64 {
        self.line
    }
}

/// A memory-mapped artifact export with its parsed header.
pub struct CsvFile {
    path: PathBuf,
    map: Mmap,
    header: Header,
}

impl CsvFile {
    pub fn open(path: &Path) -> Result<Self, NormalizeError> {
        let io_err = |source| NormalizeError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let len = file.metadata().map_err(io_err)?.len();
        if len == 0 {
            return Err(NormalizeError::EmptyFile {
                path: path.to_path_buf(),
            });
        }

        // mmap the file
        let map = unsafe { Mmap::map(&file) }.map_err(io_err)?;

        let mut csv_file = Self {
            path: path.to_path_buf(),
            map,
            header: Header::default(),
        };
        csv_file.header = csv_file.read_header()?;
        Ok(csv_file)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Size of the mapped file in bytes.
    pub fn size(&self) -> u64 {
        self.map.len() as u64
    }

    /// Data records in file order.
    pub fn rows(&self) -> Rows<'_> {
        Rows {
            header: &self.header,
            inner: reader_builder().from_reader(self.bytes()).into_byte_records(),
        }
    }

    fn bytes(&self) -> &[u8] {
        let bytes = &self.map[..];
        bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
    }

    fn read_header(&self) -> Result<Header, NormalizeError> {
        let mut reader = reader_builder().from_reader(self.bytes());
        let record = reader.byte_headers().map_err(|source| NormalizeError::Csv {
            path: self.path.clone(),
            source,
        })?;

        let names: Vec<String> = record.iter().map(|f| decode(f).trim().to_string()).collect();
        if names.iter().all(String::is_empty) {
            return Err(NormalizeError::EmptyFile {
                path: self.path.clone(),
            });
        }
        Ok(Header::new(names))
    }
}

/// Iterator over the data records of a [`CsvFile`].
pub struct Rows<'a> {
    header: &'a Header,
    inner: csv::ByteRecordsIntoIter<&'a [u8]>,
}

impl<'a> Iterator for Rows<'a> {
    type Item = Result<RawRow<'a>, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.inner.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let values = record.iter().map(decode).collect();
        Some(Ok(RawRow::new(self.header, values, line)))
    }
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn decode(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

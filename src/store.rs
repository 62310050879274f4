use crate::data::{Config, Expense, StoreError, HEADER};
use csv::StringRecord;
use log::debug;
use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
};

/// Raw rows of the backing file, header excluded. Decoding them is left to
/// the caller so that a single bad row doesn't poison the whole read.
pub(crate) type Rows = Box<dyn Iterator<Item = Result<StringRecord, csv::Error>>>;

/// Where expenses are kept. The console flows only talk to this trait, which
/// lets the tests swap the file for a buffer.
pub(crate) trait RecordStore {
    /// Creates the backing storage with its header row if it doesn't exist
    /// yet. Returns `true` only when something was created.
    fn ensure_initialized(&mut self) -> Result<bool, StoreError>;
    /// Appends one record after all existing ones.
    fn append(&mut self, expense: &Expense) -> Result<(), StoreError>;
    /// A fresh pass over every stored row, or `None` if there is no storage
    /// at all.
    fn read_all(&self) -> Result<Option<Rows>, StoreError>;
}

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Writes the header row.
pub(crate) fn write_header<W: io::Write>(writer: W) -> Result<(), StoreError> {
    let mut wtr = writer_builder().from_writer(writer);
    wtr.write_record(HEADER)?;
    wtr.flush()?;
    Ok(())
}

/// Writes one record as a CSV row, quoting fields that need it.
pub(crate) fn write_expense<W: io::Write>(writer: W, expense: &Expense) -> Result<(), StoreError> {
    let mut wtr = writer_builder().from_writer(writer);
    wtr.serialize(expense)?;
    wtr.flush()?;
    Ok(())
}

/// Lazily reads rows after the header. The reader is flexible: rows with
/// the wrong number of fields come through and are judged later.
pub(crate) fn read_rows<R: io::Read + 'static>(reader: R) -> Rows {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    Box::new(rdr.into_records())
}

/// The CSV file on disk.
#[derive(Debug)]
pub(crate) struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.path.clone(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for CsvStore {
    fn ensure_initialized(&mut self) -> Result<bool, StoreError> {
        // create_new never truncates: whatever is already there stays.
        let file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        write_header(file)?;
        debug!("created {}", self.path.display());
        Ok(true)
    }

    fn append(&mut self, expense: &Expense) -> Result<(), StoreError> {
        // The file may have been removed since startup; a headerless file
        // would lose its first record to the header skip.
        self.ensure_initialized()?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        write_expense(file, expense)?;
        debug!("appended {expense:?} to {}", self.path.display());
        Ok(())
    }

    fn read_all(&self) -> Result<Option<Rows>, StoreError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(read_rows(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("{} does not exist", self.path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Buffer-backed store for tests. `None` plays the part of a missing file.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    pub content: Option<Vec<u8>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_content(content: &str) -> Self {
        Self {
            content: Some(content.as_bytes().to_vec()),
        }
    }

    pub fn text(&self) -> Option<String> {
        self.content
            .as_ref()
            .map(|c| String::from_utf8_lossy(c).into_owned())
    }
}

#[cfg(test)]
impl RecordStore for MemoryStore {
    fn ensure_initialized(&mut self) -> Result<bool, StoreError> {
        if self.content.is_some() {
            return Ok(false);
        }
        let mut content = Vec::new();
        write_header(&mut content)?;
        self.content = Some(content);
        Ok(true)
    }

    fn append(&mut self, expense: &Expense) -> Result<(), StoreError> {
        self.ensure_initialized()?;
        if let Some(content) = self.content.as_mut() {
            write_expense(content, expense)?;
        }
        Ok(())
    }

    fn read_all(&self) -> Result<Option<Rows>, StoreError> {
        Ok(self
            .content
            .clone()
            .map(|content| read_rows(io::Cursor::new(content))))
    }
}

use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use csv::StringRecord;
use tracing::warn;

use crate::{
    error::{Result, VidmoodError},
    types::VideoRecord,
};

/// Incremental writer for harvested videos; every row is flushed as written.
pub struct VideoCsvWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl VideoCsvWriter<File> {
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_writer(File::create(path)?)
    }
}

impl<W: Write> VideoCsvWriter<W> {
    pub fn from_writer(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(VideoRecord::HEADERS)?;
        writer.flush()?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write(&mut self, record: &VideoRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| VidmoodError::IoError(e.into_error()))
    }
}

pub fn read_video_records(path: &Path) -> Result<Vec<VideoRecord>> {
    if !path.is_file() {
        return Err(VidmoodError::MissingInput(path.to_path_buf()));
    }
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader.deserialize().collect::<std::result::Result<_, _>>()?;
    Ok(records)
}

/// A CSV file loaded as strings, so scoring stages can append columns to
/// whatever an earlier stage produced.
#[derive(Debug, Clone)]
pub struct Table {
    pub path: PathBuf,
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl Table {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(VidmoodError::MissingInput(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<std::result::Result<_, _>>()?;
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| VidmoodError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }

    /// Drops rows whose `column` cell is missing or blank.
    pub fn retain_present(&mut self, column: &str) -> Result<usize> {
        let idx = self.column(column)?;
        let before = self.rows.len();
        self.rows
            .retain(|row| row.get(idx).is_some_and(|v| !v.trim().is_empty()));
        Ok(before - self.rows.len())
    }

    /// Numeric view of a column; unparsable or blank cells become `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let idx = self.column(name)?;
        Ok(self
            .rows
            .iter()
            .map(|row| row.get(idx).and_then(|v| v.trim().parse::<f64>().ok()))
            .map(|v| v.filter(|x| x.is_finite()))
            .collect())
    }

    /// Appends `names` as new columns; `values[i]` holds row `i`'s cells.
    /// Rows are first cut or padded to the header width so new cells line up
    /// with their headers.
    pub fn append_columns(&mut self, names: &[&str], values: Vec<Vec<String>>) {
        let width = self.headers.len();
        for name in names {
            self.headers.push_field(name);
        }
        for (idx, (row, cells)) in self.rows.iter_mut().zip(values).enumerate() {
            if row.len() > width {
                warn!(
                    "row {}: dropping {} cells beyond the {width} headers",
                    idx + 1,
                    row.len() - width
                );
                row.truncate(width);
            }
            while row.len() < width {
                row.push_field("");
            }
            for i in 0..names.len() {
                row.push_field(cells.get(i).map(String::as_str).unwrap_or(""));
            }
        }
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

//! CSV output for scraped vehicles.
//!
//! Values never contain commas (records normalise them to periods), so the
//! writer runs without quoting and the file stays a plain comma-joined table.
//!
//! Two modes:
//! - buffered (default): records are kept in memory and the file is written
//!   once the walk has finished. A failure mid-walk writes nothing.
//! - streaming: the file is created with the first record and every record
//!   is flushed as it arrives. A failure mid-walk leaves a partial file.
//!
//! In both modes a run with no records is an error and creates no file.

use crate::models::{FIELD_NAMES, VehicleRecord};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error on {path:?}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("No records to export")]
    NoRecords,
}

fn open_writer(path: &Path) -> Result<Writer<File>, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(file);
    writer.write_record(FIELD_NAMES)?;
    debug!("{:?}: {}", path, VehicleRecord::header_row());
    Ok(writer)
}

/// Write `records` under a header row. Returns the number of data rows.
pub fn write_records(path: &Path, records: &[VehicleRecord]) -> Result<usize, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let mut writer = open_writer(path)?;
    for record in records {
        writer.write_record(record.values())?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote {} rows to {:?}", records.len(), path);
    Ok(records.len())
}

enum Mode {
    Buffered(Vec<VehicleRecord>),
    Streaming {
        writer: Option<Writer<File>>,
        rows: usize,
    },
}

/// Destination for records as the walk produces them.
pub struct CsvSink {
    path: PathBuf,
    mode: Mode,
}

impl CsvSink {
    pub fn buffered(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: Mode::Buffered(Vec::new()),
        }
    }

    pub fn streaming(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: Mode::Streaming {
                writer: None,
                rows: 0,
            },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn push(&mut self, record: VehicleRecord) -> Result<(), ExportError> {
        match &mut self.mode {
            Mode::Buffered(records) => records.push(record),
            Mode::Streaming { writer, rows } => {
                let w = match writer.take() {
                    Some(w) => w,
                    None => {
                        debug!("Creating {:?}", self.path);
                        open_writer(&self.path)?
                    }
                };
                let w = writer.insert(w);
                w.write_record(record.values())?;
                w.flush().map_err(|source| ExportError::Io {
                    path: self.path.clone(),
                    source,
                })?;
                *rows += 1;
            }
        }
        Ok(())
    }

    /// Finish the export. Returns the number of data rows written.
    pub fn finish(self) -> Result<usize, ExportError> {
        match self.mode {
            Mode::Buffered(records) => write_records(&self.path, &records),
            Mode::Streaming { writer: None, .. } => Err(ExportError::NoRecords),
            Mode::Streaming {
                writer: Some(mut w),
                rows,
            } => {
                w.flush().map_err(|source| ExportError::Io {
                    path: self.path.clone(),
                    source,
                })?;
                info!("Wrote {} rows to {:?}", rows, self.path);
                Ok(rows)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

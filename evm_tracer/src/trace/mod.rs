//! The column trace writer and the on-disk layout of module traces.
//!
//! A module declares its columns with [`declare_columns!`](crate::declare_columns),
//! sizes a [`TraceWriter`] with its pre-computed line count, and turns the
//! filled writer into a [`ModuleTrace`].

mod column;
mod writer;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub use column::{ColumnDef, ColumnHeader, ColumnSet};
pub use writer::TraceWriter;

use crate::error::TraceError;

/// The complete trace of one module: headers and column buffers, in
/// declaration order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleTrace {
    pub module: &'static str,
    pub headers: Vec<ColumnHeader>,
    pub columns: Vec<Vec<u8>>,
}

impl ModuleTrace {
    pub fn line_count(&self) -> usize {
        self.headers.first().map_or(0, |header| header.length)
    }

    /// Returns the buffer of the column called `name`.
    pub fn column(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .iter()
            .position(|header| header.name == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Returns the cell of column `name` at `row`.
    pub fn cell(&self, name: &str, row: usize) -> Option<&[u8]> {
        let i = self.headers.iter().position(|header| header.name == name)?;
        let width = self.headers[i].width;
        self.columns[i].get(row * width..(row + 1) * width)
    }

    pub fn bin_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.bin", self.module))
    }

    pub fn headers_path(&self, dir: &Path) -> PathBuf {
        dir.join(format!("{}.headers.json", self.module))
    }

    /// Writes `<module>.bin` and `<module>.headers.json` into `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<(), TraceError> {
        let mut out = BufWriter::new(File::create(self.bin_path(dir))?);
        for column in &self.columns {
            out.write_all(column)?;
        }
        out.flush()?;

        let headers = BufWriter::new(File::create(self.headers_path(dir))?);
        serde_json::to_writer_pretty(headers, &self.headers)?;
        log::info!(
            "wrote {} rows of {} columns for {}",
            self.line_count(),
            self.headers.len(),
            self.module
        );
        Ok(())
    }
}

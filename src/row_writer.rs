//! Row-oriented CSV output.
//!
//! A `RowWriter` stages cells for one row and appends the row to its file on
//! [`RowWriter::write_row`]. The file is opened in append mode for each row and
//! closed again afterwards, so a deep export never holds more than one handle.
//!
//! [`RowWriter::fork`] copies the rows written so far into a new file and returns
//! an independent writer continuing the same schema; the per-terminus cutflow
//! tables use it to split a path into two branches.

use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use csv::WriterBuilder;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct RowWriter {
    path: PathBuf,
    headers: Vec<String>,
    buffer: Vec<String>,
}

impl RowWriter {
    /// Create (or truncate) `path` and write the header row, if any.
    pub fn create(path: impl Into<PathBuf>, headers: &[&str]) -> Result<Self> {
        let path = path.into();
        let file = File::create(&path)?;
        if !headers.is_empty() {
            let mut wtr = WriterBuilder::new().from_writer(file);
            wtr.write_record(headers)?;
            wtr.flush()?;
        }
        Ok(RowWriter { path, headers: headers.iter().map(|h| h.to_string()).collect(), buffer: Vec::new() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Stage one cell of the current row.
    pub fn push_col(&mut self, value: impl Display) -> &mut Self {
        self.buffer.push(value.to_string());
        self
    }

    /// Append the staged cells as one row and clear the buffer.
    ///
    /// Does nothing when no cell is staged.
    pub fn write_row(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record(&self.buffer)?;
        wtr.flush()?;
        self.buffer.clear();
        Ok(())
    }

    /// Copy this writer's file to `new_path` and continue there independently.
    pub fn fork(&self, new_path: impl Into<PathBuf>) -> Result<RowWriter> {
        let new_path = new_path.into();
        fs::copy(&self.path, &new_path)?;
        Ok(RowWriter { path: new_path, headers: self.headers.clone(), buffer: Vec::new() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let mut writer = RowWriter::create(&path, &["cut", "raw_events"]).unwrap();
        writer.push_col("base").push_col(3);
        writer.write_row().unwrap();
        writer.push_col("a,b").push_col(1.5);
        writer.write_row().unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "cut,raw_events\nbase,3\n\"a,b\",1.5\n");
    }

    #[test]
    fn empty_buffer_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let mut writer = RowWriter::create(&path, &[]).unwrap();
        writer.write_row().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn fork_continues_independently() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = RowWriter::create(dir.path().join("a.csv"), &["cut"]).unwrap();
        first.push_col("root");
        first.write_row().unwrap();

        let mut second = first.fork(dir.path().join("b.csv")).unwrap();
        assert_eq!(second.headers(), first.headers());
        second.push_col("failing");
        second.write_row().unwrap();
        first.push_col("passing");
        first.write_row().unwrap();

        assert_eq!(fs::read_to_string(first.path()).unwrap(), "cut\nroot\npassing\n");
        assert_eq!(fs::read_to_string(second.path()).unwrap(), "cut\nroot\nfailing\n");
    }
}

use super::error::TableError;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// A result that can be emitted as a delimited table with a header row.
pub trait ResultTable {
    /// Writes the table, header first, to `writer`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying writer fails.
    fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error>;

    /// Creates (or truncates) the file at `path` and writes the table into it.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Io`] if the file cannot be created and [`TableError::Csv`] if writing
    /// fails.
    fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| TableError::io(path, e))?;
        self.write_to(BufWriter::new(file))
            .map_err(|e| TableError::csv(path, e))
    }
}

//! Report writers.

use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writer for the flattened cluster energy list.
///
/// Output is a single-column CSV with an `energy` header.
pub struct EnergyCsvWriter<W: Write = BufWriter<File>> {
    writer: W,
}

impl EnergyCsvWriter<BufWriter<File>> {
    /// Creates a new file writer.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> EnergyCsvWriter<W> {
    /// Wraps a writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes the header and one energy per row.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_energies(&mut self, energies: &[f64]) -> Result<()> {
        writeln!(self.writer, "energy")?;
        for energy in energies {
            writeln!(self.writer, "{energy}")?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_energies_csv() {
        let file = NamedTempFile::new().unwrap();
        let mut writer = EnergyCsvWriter::create(file.path()).unwrap();
        writer.write_energies(&[70.0, 12.5]).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "energy\n70\n12.5\n");
    }

    #[test]
    fn test_empty_energies_write_header_only() {
        let mut writer = EnergyCsvWriter::new(Vec::new());
        writer.write_energies(&[]).unwrap();
        assert_eq!(writer.into_inner(), b"energy\n");
    }
}

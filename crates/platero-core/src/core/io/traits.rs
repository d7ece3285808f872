use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Common interface of the plate-related file formats.
///
/// Implementors describe how one document (a template, a plate-reader export, the protein
/// catalog) is parsed from and serialized to a byte stream; the path-based helpers open
/// the file and delegate.
pub trait PlateFile {
    /// The document read from and written to the file.
    type Content;

    /// The error type for parsing and I/O failures.
    type Error: Error + From<io::Error>;

    /// Parses a document from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the content does not follow the format or reading fails.
    fn read_from(reader: impl Read) -> Result<Self::Content, Self::Error>;

    /// Serializes a document to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to(content: &Self::Content, writer: impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Content, Self::Error> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    fn write_to_path<P: AsRef<Path>>(content: &Self::Content, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(content, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

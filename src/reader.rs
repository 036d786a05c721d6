//! Buffered file reader, with integrated .gz decompression
#[cfg(feature = "flate2")]
use flate2::read::GzDecoder;

use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Result},
    path::Path,
};

#[derive(Debug)]
pub enum BufferedReader {
    /// Readable (plain) file
    PlainFile(BufReader<File>),
    /// gzip compressed file
    #[cfg(feature = "flate2")]
    GzFile(BufReader<GzDecoder<File>>),
}

impl BufferedReader {
    /// Opens a readable file
    pub fn plain<P: AsRef<Path>>(path: P) -> Result<Self> {
        let fd = File::open(path)?;
        Ok(Self::PlainFile(BufReader::new(fd)))
    }

    /// Opens a gzip compressed file
    #[cfg(feature = "flate2")]
    pub fn gzip<P: AsRef<Path>>(path: P) -> Result<Self> {
        let fd = File::open(path)?;
        Ok(Self::GzFile(BufReader::new(GzDecoder::new(fd))))
    }

    /// Reads the entire content, which must be valid UTF-8
    pub fn read_content(&mut self) -> Result<String> {
        let mut content = String::new();
        self.read_to_string(&mut content)?;
        Ok(content)
    }
}

impl Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self {
            Self::PlainFile(ref mut h) => h.read(buf),
            #[cfg(feature = "flate2")]
            Self::GzFile(ref mut h) => h.read(buf),
        }
    }
}

impl BufRead for BufferedReader {
    fn fill_buf(&mut self) -> Result<&[u8]> {
        match self {
            Self::PlainFile(ref mut bufreader) => bufreader.fill_buf(),
            #[cfg(feature = "flate2")]
            Self::GzFile(ref mut bufreader) => bufreader.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::PlainFile(ref mut bufreader) => bufreader.consume(s),
            #[cfg(feature = "flate2")]
            Self::GzFile(ref mut bufreader) => bufreader.consume(s),
        }
    }
}

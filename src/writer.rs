//! Buffered file writer, with optional .gz compression
use std::{
    fs::File,
    io::{BufWriter, Result, Write},
    path::Path,
};

#[cfg(feature = "flate2")]
use flate2::{write::GzEncoder, Compression};

#[derive(Debug)]
pub enum BufferedWriter<W: Write> {
    /// Readable stream
    Plain(BufWriter<W>),
    /// Gzip compressed stream
    #[cfg(feature = "flate2")]
    Gz(BufWriter<GzEncoder<W>>),
}

impl<W: Write> BufferedWriter<W> {
    /// Creates new readable [BufferedWriter]
    pub fn plain(w: W) -> Self {
        Self::Plain(BufWriter::new(w))
    }
    /// Creates new [BufferedWriter] streaming gzip encoded content, with
    /// desired compression level (0-9). The higher, the slower.
    #[cfg(feature = "flate2")]
    pub fn gzip(w: W, compression_level: u32) -> Self {
        Self::Gz(BufWriter::new(GzEncoder::new(
            w,
            Compression::new(compression_level.min(9)),
        )))
    }
    /// Flushes and terminates the stream
    pub fn finish(self) -> Result<()> {
        match self {
            Self::Plain(mut writer) => writer.flush(),
            #[cfg(feature = "flate2")]
            Self::Gz(writer) => {
                let encoder = writer.into_inner().map_err(|e| e.into_error())?;
                encoder.finish()?.flush()
            },
        }
    }
}

impl BufferedWriter<File> {
    /// Creates a readable local file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::plain(File::create(path)?))
    }
}

impl<W: Write> Write for BufferedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        match self {
            Self::Plain(ref mut writer) => writer.write(buf),
            #[cfg(feature = "flate2")]
            Self::Gz(ref mut writer) => writer.write(buf),
        }
    }
    fn flush(&mut self) -> Result<()> {
        match self {
            Self::Plain(ref mut writer) => writer.flush(),
            #[cfg(feature = "flate2")]
            Self::Gz(ref mut writer) => writer.flush(),
        }
    }
}

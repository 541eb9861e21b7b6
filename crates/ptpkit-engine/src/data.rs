//! Data-phase sinks and sources.
//!
//! The engine moves data-phase bytes in bounded chunks through these two
//! capabilities and never holds a whole object unless the sink chooses to.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

const MAX_RESERVE: u64 = 16 * 1024 * 1024;

/// Consumer of inbound data-phase bytes.
pub trait ChunkSink {
    /// Called once with the payload length the device declared, or `None`
    /// when the length does not fit the container header.
    fn begin(&mut self, declared_len: Option<u64>) -> io::Result<()> {
        let _ = declared_len;
        Ok(())
    }

    /// Accept the next run of payload bytes.
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;

    /// Called after the last chunk of a complete data phase.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Producer of outbound data-phase bytes.
pub trait ChunkSource {
    /// Total payload bytes this source will yield.
    fn total_len(&self) -> u64;

    /// Fill `buf` with the next bytes. Returns 0 at end of input.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// The optional data phase of one transaction.
pub enum DataPhase<'a> {
    None,
    /// Device-to-host payload.
    Inbound(&'a mut dyn ChunkSink),
    /// Host-to-device payload.
    Outbound(&'a mut dyn ChunkSource),
}

impl DataPhase<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            DataPhase::None => "none",
            DataPhase::Inbound(_) => "inbound",
            DataPhase::Outbound(_) => "outbound",
        }
    }
}

impl std::fmt::Debug for DataPhase<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// In-memory sink that refuses payloads larger than its limit.
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
    limit: Option<usize>,
}

impl VecSink {
    /// An unbounded buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that rejects more than `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit: Some(limit),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    fn check_room(&self, extra: u64) -> io::Result<()> {
        let Some(limit) = self.limit else {
            return Ok(());
        };
        if (self.buf.len() as u64).saturating_add(extra) > limit as u64 {
            return Err(io::Error::new(
                io::ErrorKind::OutOfMemory,
                format!("data phase exceeds {limit} byte buffer limit"),
            ));
        }
        Ok(())
    }
}

impl ChunkSink for VecSink {
    fn begin(&mut self, declared_len: Option<u64>) -> io::Result<()> {
        self.buf.clear();
        if let Some(len) = declared_len {
            self.check_room(len)?;
            // The declared length is device-supplied; cap the up-front allocation.
            self.buf.reserve(len.min(MAX_RESERVE) as usize);
        }
        Ok(())
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.check_room(chunk.len() as u64)?;
        self.buf.extend_from_slice(chunk);
        Ok(())
    }
}

/// Sink that streams into any [`Write`].
#[derive(Debug)]
pub struct WriteSink<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Payload bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ChunkSink for WriteSink<W> {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.inner.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Streaming sink backed by a newly created file.
pub type FileSink = WriteSink<BufWriter<File>>;

impl FileSink {
    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

/// Sink that drops the payload and only counts it.
#[derive(Debug, Default)]
pub struct DiscardSink {
    pub received: u64,
}

impl ChunkSink for DiscardSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.received += chunk.len() as u64;
        Ok(())
    }
}

/// Source over an in-memory slice.
#[derive(Debug)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl ChunkSource for SliceSource<'_> {
    fn total_len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let rest = &self.data[self.pos..];
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Source that streams from any [`Read`] of known length.
///
/// The reader is pulled in whatever slice sizes the engine asks for, so
/// an arbitrarily large stream never has to fit in memory.
#[derive(Debug)]
pub struct ReadSource<R: Read> {
    inner: R,
    len: u64,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R, len: u64) -> Self {
        Self { inner, len }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ChunkSource for ReadSource<R> {
    fn total_len(&self) -> u64 {
        self.len
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

/// Streaming source over an existing file.
pub type FileSource = ReadSource<File>;

impl FileSource {
    /// Open `path`; the payload length is the file's current size.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self::new(file, len))
    }
}

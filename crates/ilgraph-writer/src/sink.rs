//! Byte sinks that exporters write their destinations through

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Destination of an export session.
pub trait DataSink: Send {
    /// Write as much of `bytes` as the destination accepts. Returns the
    /// number of bytes taken.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize>;

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        write_fully(self, &[byte])
    }

    fn write_text(&mut self, text: &str) -> io::Result<()> {
        write_fully(self, text.as_bytes())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn write_fully<S: DataSink + ?Sized>(sink: &mut S, bytes: &[u8]) -> io::Result<()> {
    let written = sink.write_bytes(bytes)?;
    if written < bytes.len() {
        return Err(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("sink accepted {} of {} bytes", written, bytes.len()),
        ));
    }
    Ok(())
}

/// Sink backed by a file on disk.
pub struct FileSink {
    file: File,
    path: PathBuf,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        Ok(FileSink { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSink for FileSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.file.write_all(bytes)?;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DataSink for NullSink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize> {
        Ok(bytes.len())
    }
}

/// Sink collecting bytes in a shared buffer. Clones share the buffer, so a
/// caller can keep one to read back what a session wrote.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DataSink for MemorySink {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(bytes);
        Ok(bytes.len())
    }
}

/// Opens named destinations for export sessions.
pub trait SinkProvider: Send + Sync {
    fn open(&self, name: &str) -> io::Result<Box<dyn DataSink>>;
}

/// Creates one file per destination inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySinks {
    dir: PathBuf,
}

impl DirectorySinks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySinks { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SinkProvider for DirectorySinks {
    fn open(&self, name: &str) -> io::Result<Box<dyn DataSink>> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let sink = FileSink::create(self.dir.join(name))?;
        tracing::debug!("Opened graph destination: {}", sink.path().display());
        Ok(Box::new(sink))
    }
}

/// Hands out `NullSink`s.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSinks;

impl SinkProvider for NullSinks {
    fn open(&self, _name: &str) -> io::Result<Box<dyn DataSink>> {
        Ok(Box::new(NullSink))
    }
}

/// Hands out `MemorySink`s and remembers them by destination name.
#[derive(Debug, Default, Clone)]
pub struct MemorySinks {
    opened: Arc<Mutex<Vec<(String, MemorySink)>>>,
}

impl MemorySinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination names in the order they were opened.
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    /// Bytes written to the named destination.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.lock()
            .iter()
            .find(|(opened, _)| opened == name)
            .map(|(_, sink)| sink.contents())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(String, MemorySink)>> {
        self.opened.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SinkProvider for MemorySinks {
    fn open(&self, name: &str) -> io::Result<Box<dyn DataSink>> {
        let sink = MemorySink::new();
        self.lock().push((name.to_string(), sink.clone()));
        Ok(Box::new(sink))
    }
}

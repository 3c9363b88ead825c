//! File writer for the tracing subscriber, opened on first use

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// Log sink that creates its file on the first write
///
/// Clones share one handle. A file deleted while logging is recreated on the
/// next write.
#[derive(Debug, Clone)]
pub struct LazyFileWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl LazyFileWriter {
    /// Writer for `path`; nothing is created until the first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Arc::new(Mutex::new(None)),
        }
    }

    /// File the writer appends to
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Writer handed out per event by [`LazyFileWriter`]
#[derive(Debug)]
pub struct LazyWriter {
    path: PathBuf,
    file: Arc<Mutex<Option<File>>>,
}

impl Write for LazyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut slot = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;

        let file = match slot.take() {
            Some(file) if self.path.exists() => file,
            _ => open_append(&self.path)?,
        };
        let file = slot.insert(file);
        if let Ok(written) = file.write(buf) {
            return Ok(written);
        }

        // stale handle
        let mut file = open_append(&self.path)?;
        let written = file.write(buf)?;
        *slot = Some(file);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut slot = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file mutex poisoned"))?;

        if !self.path.exists() {
            *slot = None;
            return Ok(());
        }
        if let Some(file) = slot.as_mut()
            && file.flush().is_err()
        {
            *slot = Some(open_append(&self.path)?);
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LazyFileWriter {
    type Writer = LazyWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LazyWriter {
            path: self.path.clone(),
            file: Arc::clone(&self.file),
        }
    }
}

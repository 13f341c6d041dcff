// src/storage/part.rs

//! Buffered per-segment chapter writer.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::models::ChapterContent;

/// Appends rendered chapters to one part file.
///
/// The buffer is flushed every `flush_every` chapters, so an interrupted run
/// loses at most the chapters written since the last flush.
pub struct PartWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    flush_every: usize,
    pending: usize,
    pending_bytes: u64,
    written: usize,
    flushed: usize,
    flushed_bytes: u64,
}

impl PartWriter {
    /// Create (or truncate) the part file at `path`.
    pub async fn create(path: impl AsRef<Path>, flush_every: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            flush_every: flush_every.max(1),
            pending: 0,
            pending_bytes: 0,
            written: 0,
            flushed: 0,
            flushed_bytes: 0,
        })
    }

    pub async fn write_chapter(&mut self, chapter: &ChapterContent) -> Result<()> {
        let rendered = chapter.render();
        self.writer.write_all(rendered.as_bytes()).await?;
        self.written += 1;
        self.pending += 1;
        self.pending_bytes += rendered.len() as u64;
        if self.pending >= self.flush_every {
            self.flush().await?;
        }
        Ok(())
    }

    /// Chapters known to be on disk.
    pub fn flushed(&self) -> usize {
        self.flushed
    }

    /// Flush the remaining buffer and return the number of chapters written.
    pub async fn finish(&mut self) -> Result<usize> {
        self.flush().await?;
        log::debug!("Closed {} with {} chapter(s)", self.path.display(), self.written);
        Ok(self.written)
    }

    /// Give up after a write error, keeping only the flushed chapters.
    ///
    /// Anything past the last successful flush is cut off so the part never
    /// ends in a partial chapter. Returns the chapters kept; when the file
    /// cannot be trimmed it is removed and nothing is kept.
    pub async fn salvage(self) -> usize {
        let Self {
            path,
            writer,
            flushed,
            flushed_bytes,
            ..
        } = self;
        // Let any in-flight write settle before trimming behind it.
        let mut file = writer.into_inner();
        if let Err(e) = file.flush().await {
            log::debug!("Pending write to {} failed: {}", path.display(), e);
        }
        drop(file);

        match truncate(&path, flushed_bytes).await {
            Ok(()) => {
                log::debug!("Kept {} flushed chapter(s) in {}", flushed, path.display());
                flushed
            }
            Err(e) => {
                log::warn!("Could not trim {}: {}; dropping it", path.display(), e);
                if let Err(e) = crate::storage::remove_if_exists(&path).await {
                    log::warn!("Could not remove {}: {}", path.display(), e);
                }
                0
            }
        }
    }

    async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        self.flushed = self.written;
        self.flushed_bytes += self.pending_bytes;
        self.pending = 0;
        self.pending_bytes = 0;
        Ok(())
    }
}

async fn truncate(path: &Path, len: u64) -> std::io::Result<()> {
    let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(len).await
}

use crate::paths::FocalPaths;
use focal_core::codec::{decode_lines, encode, DecodeMode, Decoded};
use focal_core::{Result, SessionRecord};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// The append-only session log backed by `sessions.jsonl`.
///
/// Appends take the write side of an in-process lock and full reads take
/// the read side, so a reader never sees half a line.
pub struct SessionLog {
    path: PathBuf,
    fsync: bool,
    guard: RwLock<()>,
}

impl SessionLog {
    /// Open the log of an existing workspace. Fails if `.focal/` does not exist.
    pub fn open(paths: &FocalPaths) -> anyhow::Result<Self> {
        if !paths.is_initialized() {
            anyhow::bail!(
                "not a focal workspace ({} not found). Run `focal init` first.",
                paths.focal_dir.display()
            );
        }
        Ok(Self::at(&paths.sessions_jsonl))
    }

    /// Use an arbitrary file as the log. The file need not exist yet.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fsync: false,
            guard: RwLock::new(()),
        }
    }

    /// Call `sync_all` after every append.
    pub fn with_fsync(mut self, fsync: bool) -> Self {
        self.fsync = fsync;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line.
    ///
    /// On error the caller must assume nothing was persisted.
    pub fn append(&self, record: &SessionRecord) -> Result<()> {
        let mut line = encode(record)?;
        line.push('\n');

        let _w = self.guard.write().unwrap_or_else(|e| e.into_inner());
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)?;

        // A torn tail from an earlier crash must not swallow this record.
        if file.metadata()?.len() > 0 {
            let mut last = [0u8; 1];
            file.seek(SeekFrom::End(-1))?;
            file.read_exact(&mut last)?;
            if last[0] != b'\n' {
                line.insert(0, '\n');
            }
        }

        file.write_all(line.as_bytes())?;
        if self.fsync {
            file.sync_all()?;
        }
        Ok(())
    }

    /// Read and decode the whole log. A missing file is an empty log.
    pub fn read(&self, mode: DecodeMode) -> Result<Decoded> {
        let body = {
            let _r = self.guard.read().unwrap_or_else(|e| e.into_inner());
            match std::fs::read(&self.path) {
                Ok(body) => body,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
                Err(e) => return Err(e.into()),
            }
        };
        let decoded = decode_lines(&body, mode)?;
        for line in &decoded.skipped {
            tracing::warn!(
                path = %self.path.display(),
                line,
                "skipping corrupt session record"
            );
        }
        Ok(decoded)
    }

    /// All decodable records in log order; corrupt lines are dropped.
    pub fn read_all(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.read(DecodeMode::Tolerant)?.records)
    }

    /// All records in log order; fails on the first corrupt line.
    pub fn read_all_strict(&self) -> Result<Vec<SessionRecord>> {
        Ok(self.read(DecodeMode::Strict)?.records)
    }

    /// Current size of the log file in bytes (0 when absent).
    pub fn len_bytes(&self) -> Result<u64> {
        let _r = self.guard.read().unwrap_or_else(|e| e.into_inner());
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

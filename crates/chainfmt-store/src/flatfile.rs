//! Append-only flat files addressed by 32-bit offsets.
//!
//! Each file starts with a 4-byte magic, so no record ever sits at offset 0
//! and [`UNDO_POS_UNSET`] stays unambiguous. Appends reserve the exact record
//! size at the end of the file under a lock before writing, which keeps
//! concurrent appenders from overlapping. A failed write gives the
//! reservation back by truncating the file to its previous length.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use chainfmt_core::constants::UNDO_POS_UNSET;
use chainfmt_core::{
    BlockIndexRecord, BlockUndo, CodecError, Deserializable, FormatConfig, Serializable,
};

use crate::error::StoreError;

/// Magic at the head of an undo file.
pub const UNDO_FILE_MAGIC: [u8; 4] = *b"UNDO";

/// Magic at the head of a block-index file.
pub const INDEX_FILE_MAGIC: [u8; 4] = *b"BIDX";

/// Offset of the first record in any flat file.
pub const FIRST_RECORD_POS: u32 = 4;

/// Counts the bytes passed through to the inner writer.
struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct FlatFile {
    path: PathBuf,
    magic: [u8; 4],
    file: Mutex<File>,
}

impl FlatFile {
    fn open(path: &Path, magic: [u8; 4]) -> Result<Self, StoreError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if file.metadata()?.len() == 0 {
            file.write_all(&magic)?;
            file.sync_data()?;
        } else {
            let mut found = [0u8; 4];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut found)?;
            if found != magic {
                return Err(StoreError::BadMagic { expected: magic, found });
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            magic,
            file: Mutex::new(file),
        })
    }

    fn len(&self) -> Result<u64, StoreError> {
        Ok(self.file.lock().metadata()?.len())
    }

    /// Reserve `size` bytes at the end of the file and fill them with `encode`.
    fn append_with<F>(&self, size: u64, encode: F) -> Result<u32, StoreError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), CodecError>,
    {
        let mut file = self.file.lock();
        let pos = file.metadata()?.len();
        let end = pos + size;
        if end > u64::from(u32::MAX) {
            return Err(StoreError::OffsetOverflow(end));
        }
        file.set_len(end)?;

        if let Err(e) = Self::fill(&mut file, pos, size, encode) {
            tracing::warn!(path = %self.path.display(), pos, size, error = %e, "append failed, releasing reservation");
            file.set_len(pos)?;
            return Err(e);
        }
        Ok(pos as u32)
    }

    fn fill<F>(file: &mut File, pos: u64, size: u64, encode: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), CodecError>,
    {
        file.seek(SeekFrom::Start(pos))?;
        let mut w = CountingWriter { inner: BufWriter::new(&mut *file), written: 0 };
        encode(&mut w)?;
        w.flush()?;
        if w.written != size {
            return Err(StoreError::SizeMismatch { reserved: size, written: w.written });
        }
        Ok(())
    }

    /// Buffered reader positioned at `pos`, on its own file handle.
    fn reader_at(&self, pos: u32) -> Result<BufReader<File>, StoreError> {
        if pos < FIRST_RECORD_POS {
            return Err(StoreError::InvalidPosition(pos));
        }
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(u64::from(pos)))?;
        Ok(BufReader::new(file))
    }

    fn sync(&self) -> Result<(), StoreError> {
        self.file.lock().sync_data()?;
        Ok(())
    }
}

impl std::fmt::Debug for FlatFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatFile")
            .field("path", &self.path)
            .field("magic", &String::from_utf8_lossy(&self.magic))
            .finish()
    }
}

/// Undo file: block undo records addressed by `undo_pos`.
#[derive(Debug)]
pub struct UndoFile {
    inner: FlatFile,
    config: FormatConfig,
}

impl UndoFile {
    /// Open or create an undo file at `path`.
    pub fn open(path: impl AsRef<Path>, config: FormatConfig) -> Result<Self, StoreError> {
        Ok(Self {
            inner: FlatFile::open(path.as_ref(), UNDO_FILE_MAGIC)?,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Current file length in bytes, magic included.
    pub fn file_len(&self) -> Result<u64, StoreError> {
        self.inner.len()
    }

    /// Append `undo` and return the offset to record as the block's `undo_pos`.
    ///
    /// The region is sized with [`BlockUndo::serialize_size`] before any byte
    /// is written.
    pub fn append<C: Serializable>(&self, undo: &BlockUndo<C>) -> Result<u32, StoreError> {
        let size = undo.serialize_size()? as u64;
        let pos = self.inner.append_with(size, |w| undo.serialize(w))?;
        tracing::debug!(pos, size, txs = undo.len(), "appended block undo");
        Ok(pos)
    }

    /// Read the block undo stored at `pos`.
    pub fn read_at<C: Deserializable>(&self, pos: u32) -> Result<BlockUndo<C>, StoreError> {
        let mut reader = self.inner.reader_at(pos)?;
        BlockUndo::deserialize(&mut reader, &self.config).map_err(|e| {
            if e.is_corruption() {
                tracing::warn!(path = %self.inner.path.display(), pos, error = %e, "corrupt block undo");
            }
            e.into()
        })
    }

    /// Read the undo data a block-index record points at, if it has any.
    pub fn read_for<C: Deserializable, H>(
        &self,
        record: &BlockIndexRecord<H>,
    ) -> Result<Option<BlockUndo<C>>, StoreError> {
        if record.undo_pos == UNDO_POS_UNSET {
            return Ok(None);
        }
        self.read_at(record.undo_pos).map(Some)
    }

    /// Flush file contents to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.inner.sync()
    }
}

/// Block-index file: block-index records stored back to back.
#[derive(Debug)]
pub struct IndexFile {
    inner: FlatFile,
    config: FormatConfig,
}

impl IndexFile {
    /// Open or create a block-index file at `path`.
    pub fn open(path: impl AsRef<Path>, config: FormatConfig) -> Result<Self, StoreError> {
        Ok(Self {
            inner: FlatFile::open(path.as_ref(), INDEX_FILE_MAGIC)?,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Append `record` tagged with the configured client version and return
    /// its offset.
    pub fn append<H: Serializable>(&self, record: &BlockIndexRecord<H>) -> Result<u32, StoreError> {
        let size = record.serialized_size()? as u64;
        let pos = self.inner.append_with(size, |w| record.serialize(&self.config, w))?;
        tracing::debug!(pos, height = record.height, "appended block index record");
        Ok(pos)
    }

    /// Read the record stored at `pos`.
    pub fn read_at<H: Deserializable>(&self, pos: u32) -> Result<BlockIndexRecord<H>, StoreError> {
        self.read_versioned_at(pos).map(|(_, record)| record)
    }

    /// Read the record stored at `pos` and the client version it carries.
    pub fn read_versioned_at<H: Deserializable>(
        &self,
        pos: u32,
    ) -> Result<(i32, BlockIndexRecord<H>), StoreError> {
        let mut reader = self.inner.reader_at(pos)?;
        Ok(BlockIndexRecord::deserialize_versioned(&mut reader)?)
    }

    /// Read every record in file order together with its offset.
    ///
    /// Fails on the first record that does not decode; a partial record at
    /// the tail is reported as truncation.
    pub fn load_all<H: Deserializable>(&self) -> Result<Vec<(u32, BlockIndexRecord<H>)>, StoreError> {
        let len = self.inner.len()?;
        let mut reader = self.inner.reader_at(FIRST_RECORD_POS)?;
        let mut pos = u64::from(FIRST_RECORD_POS);
        let mut records = Vec::new();
        while pos < len {
            let record = BlockIndexRecord::deserialize(&mut reader)?;
            records.push((pos as u32, record));
            pos = reader.stream_position()?;
        }
        tracing::debug!(count = records.len(), "loaded block index");
        Ok(records)
    }

    /// Flush file contents to disk.
    pub fn sync(&self) -> Result<(), StoreError> {
        self.inner.sync()
    }
}

//! Per-frame timestamp logs.
//!
//! Two parallel files of little-endian `f64` records: the camera's frame
//! counter and the host arrival time. Record `i` of one file belongs to
//! record `i` of the other. Records are buffered and written in batches.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use memmap2::Mmap;
use tracing::{debug, warn};

use crate::consts::TIMESTAMP_BATCH_SIZE;
use crate::error::{BeamviewError, Result};

const RECORD_SIZE: usize = std::mem::size_of::<f64>();

/// Appends frame/host timestamp pairs to two binary files.
pub struct TimestampLogger {
    frame: BufWriter<File>,
    host: BufWriter<File>,
    pending: Vec<(f64, f64)>,
    batch_size: usize,
    written: u64,
}

impl TimestampLogger {
    /// Create (truncating) both log files.
    pub fn create(frame_path: &Path, host_path: &Path) -> Result<Self> {
        Ok(Self {
            frame: BufWriter::new(File::create(frame_path)?),
            host: BufWriter::new(File::create(host_path)?),
            pending: Vec::with_capacity(TIMESTAMP_BATCH_SIZE),
            batch_size: TIMESTAMP_BATCH_SIZE,
            written: 0,
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Queue one record pair; a full batch is written out.
    pub fn record(&mut self, frame_timestamp: f64, host_timestamp: f64) -> Result<()> {
        self.pending.push((frame_timestamp, host_timestamp));
        if self.pending.len() >= self.batch_size {
            self.write_batch()?;
        }
        Ok(())
    }

    /// Records handed to the files so far (excluding the pending batch).
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn write_batch(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        for &(frame_ts, host_ts) in &self.pending {
            self.frame.write_f64::<LittleEndian>(frame_ts)?;
            self.host.write_f64::<LittleEndian>(host_ts)?;
        }
        self.frame.flush()?;
        self.host.flush()?;
        self.written += self.pending.len() as u64;
        debug!(records = self.pending.len(), total = self.written, "Timestamp batch written");
        self.pending.clear();
        Ok(())
    }

    /// Write any partial batch and close the files. Returns the total
    /// number of records.
    pub fn finish(mut self) -> Result<u64> {
        self.write_batch()?;
        Ok(self.written)
    }
}

impl Drop for TimestampLogger {
    fn drop(&mut self) {
        if let Err(e) = self.write_batch() {
            warn!(error = %e, "Failed to flush timestamp log");
        }
    }
}

/// Memory-mapped read access to one timestamp log file.
pub struct TimestampLog {
    mmap: Option<Mmap>,
}

impl TimestampLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len() as usize;
        if len % RECORD_SIZE != 0 {
            return Err(BeamviewError::InvalidTimestampLog(format!(
                "{}: size {len} is not a multiple of {RECORD_SIZE}",
                path.display()
            )));
        }
        if len == 0 {
            return Ok(Self { mmap: None });
        }
        // The file is only read while mapped.
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { mmap: Some(mmap) })
    }

    fn bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes().len() / RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        let start = index.checked_mul(RECORD_SIZE)?;
        let record = self.bytes().get(start..start + RECORD_SIZE)?;
        Some(LittleEndian::read_f64(record))
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.bytes().chunks_exact(RECORD_SIZE).map(LittleEndian::read_f64)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.iter().collect()
    }
}

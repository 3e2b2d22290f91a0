use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::consts::SEQUENCE_BIT_WIDTH;
use crate::error::{BeamviewError, Result};
use crate::io::image_io::load_raw_image;

use super::source::{AcquisitionSource, RawFrame, ResolutionRequest, SensorBounds};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Picks up image files another program drops into a directory, oldest
/// name first. Files are read once and optionally deleted.
///
/// A file that fails to decode is retried once its size changes, so a
/// file caught halfway through being written is read when it is complete.
#[derive(Debug)]
pub struct DirectorySource {
    dir: PathBuf,
    connected: bool,
    streaming: bool,
    delete_after_read: bool,
    expected_bytes: Option<u64>,
    sensor: SensorBounds,
    counter: u32,
    /// Files already delivered that are still in the directory.
    seen: HashSet<PathBuf>,
    /// Undecodable files and their size at the failed attempt.
    failed: HashMap<PathBuf, u64>,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            connected: false,
            streaming: false,
            delete_after_read: false,
            expected_bytes: None,
            sensor: SensorBounds {
                width: 0,
                height: 0,
            },
            counter: 0,
            seen: HashSet::new(),
            failed: HashMap::new(),
        }
    }

    /// Remove each file once it has been read.
    pub fn with_delete_after_read(mut self, delete: bool) -> Self {
        self.delete_after_read = delete;
        self
    }

    /// Only accept files of exactly this size, so partially written files
    /// are left alone until they are complete.
    pub fn with_expected_bytes(mut self, bytes: u64) -> Self {
        self.expected_bytes = Some(bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_candidate(&mut self) -> Result<Option<(PathBuf, u64)>> {
        let mut present = HashSet::new();
        let mut candidates = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            if !is_image_file(&path) {
                continue;
            }
            present.insert(path.clone());
            if self.seen.contains(&path) {
                continue;
            }
            // Files still being written may vanish or change size; skip them
            // this round.
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let len = meta.len();
            if self.expected_bytes.is_some_and(|n| len != n) {
                continue;
            }
            if self.failed.get(&path) == Some(&len) {
                continue;
            }
            candidates.push((path, len));
        }

        // A name that disappears and comes back is a new file.
        self.seen.retain(|p| present.contains(p));
        self.failed.retain(|p, _| present.contains(p));

        candidates.sort();
        Ok(candidates.into_iter().next())
    }
}

fn is_image_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("tif" | "tiff" | "png")
    )
}

impl AcquisitionSource for DirectorySource {
    fn list_devices(&mut self) -> Result<Vec<String>> {
        Ok(vec![self.dir.display().to_string()])
    }

    fn connect(&mut self, device_id: &str) -> Result<()> {
        if Path::new(device_id) != self.dir {
            return Err(BeamviewError::Device(format!("no device {device_id}")));
        }
        if !self.dir.is_dir() {
            return Err(BeamviewError::Device(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }
        self.connected = true;
        info!(dir = %self.dir.display(), "Watching directory");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.connected = false;
        self.streaming = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn sensor(&self) -> SensorBounds {
        self.sensor
    }

    /// Files carry their own size, so any request is accepted as-is.
    fn open_stream(&mut self, request: ResolutionRequest) -> Result<Option<ResolutionRequest>> {
        if !self.connected {
            return Err(BeamviewError::NotConnected);
        }
        self.streaming = true;
        Ok(Some(request))
    }

    fn close_stream(&mut self) -> Result<()> {
        self.streaming = false;
        Ok(())
    }

    fn next_frame(&mut self, timeout: Duration) -> Result<Option<RawFrame>> {
        if !self.streaming {
            return Err(BeamviewError::NotConnected);
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some((path, len)) = self.next_candidate()? {
                match load_raw_image(&path) {
                    Ok(pixels) => {
                        debug!(file = %path.display(), "New file");
                        self.failed.remove(&path);
                        let (h, w) = pixels.dim();
                        self.sensor = SensorBounds {
                            width: w as u32,
                            height: h as u32,
                        };
                        let deleted = self.delete_after_read
                            && match std::fs::remove_file(&path) {
                                Ok(()) => true,
                                Err(e) => {
                                    warn!(file = %path.display(), error = %e, "Could not delete file");
                                    false
                                }
                            };
                        if !deleted {
                            self.seen.insert(path);
                        }
                        let frame = RawFrame::new(pixels, self.counter);
                        self.counter = (self.counter + 1) % (1 << SEQUENCE_BIT_WIDTH);
                        return Ok(Some(frame));
                    }
                    Err(e) => {
                        if self.failed.insert(path.clone(), len).is_none() {
                            warn!(file = %path.display(), error = %e, "Unreadable file, retrying once it changes");
                        } else {
                            debug!(file = %path.display(), error = %e, "Still unreadable");
                        }
                        continue;
                    }
                }
            }

            if Instant::now() >= deadline {
                return Ok(None);
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn bit_depth(&self) -> u8 {
        16
    }
}

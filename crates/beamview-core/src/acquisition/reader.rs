use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::Result;

use super::source::{AcquisitionSource, RawFrame};

/// Messages from the acquisition thread to the processing consumer.
#[derive(Debug)]
pub enum AcquisitionEvent {
    Frame(RawFrame),
    /// The driver failed; the reader has shut the stream down and exited.
    Disconnected { reason: String },
}

/// Owns the acquisition thread.
///
/// The thread waits on the driver with a bounded timeout, copies each frame
/// out and offers it to the consumer through a single slot. When the slot
/// is still occupied the frame is discarded instead of queued.
pub struct AcquisitionReader {
    stop: Arc<AtomicBool>,
    skipped: Arc<AtomicU64>,
    handle: Option<JoinHandle<Box<dyn AcquisitionSource>>>,
}

impl AcquisitionReader {
    /// Start reading from an already connected, streaming source.
    pub fn spawn(
        source: Box<dyn AcquisitionSource>,
        timeout: Duration,
    ) -> Result<(Self, Receiver<AcquisitionEvent>)> {
        let (tx, rx) = mpsc::sync_channel::<AcquisitionEvent>(1);
        let stop = Arc::new(AtomicBool::new(false));
        let skipped = Arc::new(AtomicU64::new(0));

        let thread_stop = Arc::clone(&stop);
        let thread_skipped = Arc::clone(&skipped);
        let handle = std::thread::Builder::new()
            .name("beamview-acquisition".into())
            .spawn(move || reader_loop(source, tx, thread_stop, thread_skipped, timeout))?;

        Ok((
            Self {
                stop,
                skipped,
                handle: Some(handle),
            },
            rx,
        ))
    }

    /// Frames the consumer was too busy to take.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the thread to stop after the current wait and hand the source
    /// back. Takes at most one acquisition timeout.
    pub fn stop(mut self) -> Option<Box<dyn AcquisitionSource>> {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.take().and_then(|h| h.join().ok())
    }
}

impl Drop for AcquisitionReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn reader_loop(
    mut source: Box<dyn AcquisitionSource>,
    tx: SyncSender<AcquisitionEvent>,
    stop: Arc<AtomicBool>,
    skipped: Arc<AtomicU64>,
    timeout: Duration,
) -> Box<dyn AcquisitionSource> {
    info!("Acquisition thread started");

    while !stop.load(Ordering::Relaxed) && source.is_connected() {
        match source.next_frame(timeout) {
            Ok(Some(frame)) => match tx.try_send(AcquisitionEvent::Frame(frame)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    skipped.fetch_add(1, Ordering::Relaxed);
                    debug!("Consumer busy, frame discarded");
                }
                Err(TrySendError::Disconnected(_)) => break,
            },
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Acquisition failed, disconnecting");
                let event = AcquisitionEvent::Disconnected {
                    reason: e.to_string(),
                };
                deliver_until_stopped(&tx, event, &stop);
                break;
            }
        }
    }

    if let Err(e) = source.close_stream() {
        debug!(error = %e, "close_stream failed");
    }
    if let Err(e) = source.disconnect() {
        debug!(error = %e, "disconnect failed");
    }
    info!("Acquisition thread stopped");
    source
}

/// Wait for the slot to free up, giving up once a stop is requested.
fn deliver_until_stopped(
    tx: &SyncSender<AcquisitionEvent>,
    mut event: AcquisitionEvent,
    stop: &AtomicBool,
) {
    loop {
        match tx.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => return,
            Err(TrySendError::Full(pending)) => {
                if stop.load(Ordering::Relaxed) {
                    return;
                }
                event = pending;
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

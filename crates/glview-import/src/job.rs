//! Background model decoding
//!
//! A [`DecodeJob`] owns one worker thread that streams the model bytes into a
//! staging buffer, reports progress, then decodes. The UI thread polls it once
//! per frame. Dropping the job cancels it: the worker notices between chunks
//! and exits without sending a result, and any result already in flight is
//! dropped with the receiver.

use crate::glb::decode_glb;
use crate::types::ImportResult;
use glview_core::{Result, ViewerError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Bytes copied per streaming step
pub const STREAM_CHUNK_BYTES: usize = 64 * 1024;

/// Where a decode currently stands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadProgress {
    /// Started, size not yet known to the overlay
    Pending,
    /// Bytes arriving
    Streaming { loaded: u64, total: u64 },
    /// All bytes in, parsing and building meshes
    Decoding,
}

impl LoadProgress {
    /// Completed fraction in `0.0..=1.0`, or `None` while indeterminate
    pub fn fraction(&self) -> Option<f32> {
        match *self {
            LoadProgress::Pending => None,
            LoadProgress::Streaming { loaded, total } => {
                if total == 0 {
                    Some(1.0)
                } else {
                    Some((loaded as f64 / total as f64).clamp(0.0, 1.0) as f32)
                }
            }
            LoadProgress::Decoding => Some(1.0),
        }
    }

    /// Whole percent, rounded down
    pub fn percent(&self) -> Option<u32> {
        self.fraction().map(|f| (f * 100.0).floor() as u32)
    }
}

/// Message from the worker thread
#[derive(Debug)]
pub enum DecodeEvent {
    Progress(LoadProgress),
    Done(Box<ImportResult>),
    Failed(ViewerError),
}

/// Handle to an in-flight decode
pub struct DecodeJob {
    receiver: Receiver<DecodeEvent>,
    cancelled: Arc<AtomicBool>,
    finished: bool,
}

impl DecodeJob {
    /// Start decoding on a new thread. When `fit_radius` is set the decoded
    /// model is centred and scaled to that bounding-sphere radius.
    pub fn spawn(bytes: Arc<[u8]>, fit_radius: Option<f32>) -> Self {
        let (sender, receiver) = channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let spawned = thread::Builder::new()
            .name("glview-decode".to_string())
            .spawn(move || run(bytes, fit_radius, flag, sender));

        if let Err(e) = spawned {
            log::error!("Failed to start decode thread: {}", e);
        }

        Self {
            receiver,
            cancelled,
            finished: false,
        }
    }

    /// Drain every event that has arrived since the last poll. Never blocks.
    pub fn poll(&mut self) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        while !self.finished {
            match self.receiver.try_recv() {
                Ok(event) => {
                    self.finished = matches!(event, DecodeEvent::Done(_) | DecodeEvent::Failed(_));
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    if !self.is_cancelled() {
                        events.push(DecodeEvent::Failed(worker_lost()));
                    }
                }
            }
        }
        events
    }

    /// Block until the decode finishes, ignoring progress.
    pub fn wait(mut self) -> Result<ImportResult> {
        while let Ok(event) = self.receiver.recv() {
            match event {
                DecodeEvent::Progress(_) => {}
                DecodeEvent::Done(result) => {
                    self.finished = true;
                    return Ok(*result);
                }
                DecodeEvent::Failed(err) => {
                    self.finished = true;
                    return Err(err);
                }
            }
        }
        Err(worker_lost())
    }

    /// Ask the worker to stop. No further events will be reported.
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.finished = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// A terminal event was delivered, or the job was cancelled
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for DecodeJob {
    fn drop(&mut self) {
        if !self.finished {
            log::debug!("Cancelling in-flight decode");
        }
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

fn worker_lost() -> ViewerError {
    ViewerError::DecodeFailed("decoder stopped unexpectedly".to_string())
}

fn run(
    bytes: Arc<[u8]>,
    fit_radius: Option<f32>,
    cancelled: Arc<AtomicBool>,
    sender: Sender<DecodeEvent>,
) {
    let is_cancelled = || cancelled.load(Ordering::SeqCst);
    let total = bytes.len() as u64;
    let mut staged = Vec::with_capacity(bytes.len());
    let mut last_percent = None;

    for chunk in bytes.chunks(STREAM_CHUNK_BYTES) {
        if is_cancelled() {
            return;
        }
        staged.extend_from_slice(chunk);
        let progress = LoadProgress::Streaming {
            loaded: staged.len() as u64,
            total,
        };
        if progress.percent() != last_percent {
            last_percent = progress.percent();
            // Receiver gone means the job was dropped.
            if sender.send(DecodeEvent::Progress(progress)).is_err() {
                return;
            }
        }
    }

    if is_cancelled() || sender.send(DecodeEvent::Progress(LoadProgress::Decoding)).is_err() {
        return;
    }

    let event = match decode_glb(&staged) {
        Ok(mut result) => {
            if let Some(radius) = fit_radius {
                result.fit_to_radius(radius);
            }
            DecodeEvent::Done(Box::new(result))
        }
        Err(e) => {
            log::debug!("Decode failed after {} bytes: {}", total, e);
            DecodeEvent::Failed(e)
        }
    };

    if !is_cancelled() {
        let _ = sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use std::time::{Duration, Instant};

    fn drain(job: &mut DecodeJob) -> Vec<DecodeEvent> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut events = Vec::new();
        while !job.is_finished() && Instant::now() < deadline {
            events.extend(job.poll());
            thread::sleep(Duration::from_millis(1));
        }
        events
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(LoadProgress::Pending.fraction(), None);
        assert_eq!(LoadProgress::Streaming { loaded: 1, total: 4 }.percent(), Some(25));
        assert_eq!(LoadProgress::Streaming { loaded: 0, total: 0 }.percent(), Some(100));
        assert_eq!(LoadProgress::Decoding.percent(), Some(100));
    }

    #[test]
    fn test_job_reports_progress_then_result() {
        let bytes: Arc<[u8]> = fixtures::triangle_glb().into();
        let mut job = DecodeJob::spawn(bytes, None);
        let events = drain(&mut job);

        let (last, progress) = events.split_last().unwrap();
        assert!(matches!(last, DecodeEvent::Done(_)));

        let percents: Vec<u32> = progress
            .iter()
            .map(|e| match e {
                DecodeEvent::Progress(p) => p.percent().unwrap(),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert!(matches!(
            progress.last(),
            Some(DecodeEvent::Progress(LoadProgress::Decoding))
        ));
    }

    #[test]
    fn test_large_input_streams_in_chunks() {
        // Four chunks of garbage: streams fully, then fails to decode.
        let bytes: Arc<[u8]> = vec![0u8; STREAM_CHUNK_BYTES * 4].into();
        let mut job = DecodeJob::spawn(bytes, None);
        let events = drain(&mut job);

        let streaming = events
            .iter()
            .filter(|e| matches!(e, DecodeEvent::Progress(LoadProgress::Streaming { .. })))
            .count();
        assert_eq!(streaming, 4);
        assert!(matches!(
            events.last(),
            Some(DecodeEvent::Failed(ViewerError::DecodeFailed(_)))
        ));
    }

    #[test]
    fn test_wait_applies_fit() {
        let bytes: Arc<[u8]> = fixtures::triangle_glb().into();
        let result = DecodeJob::spawn(bytes, Some(1.25)).wait().unwrap();
        let b = result.bounds().unwrap();
        assert!((b.radius() - 1.25).abs() < 1e-4);
    }

    #[test]
    fn test_wait_reports_failure() {
        let bytes: Arc<[u8]> = b"nope".to_vec().into();
        assert!(matches!(
            DecodeJob::spawn(bytes, None).wait(),
            Err(ViewerError::DecodeFailed(_))
        ));
    }

    #[test]
    fn test_cyclic_hierarchy_fails_instead_of_hanging() {
        let bytes: Arc<[u8]> = fixtures::cyclic_nodes_glb().into();
        let mut job = DecodeJob::spawn(bytes, None);
        let events = drain(&mut job);
        assert!(matches!(
            events.last(),
            Some(DecodeEvent::Failed(ViewerError::DecodeFailed(_)))
        ));
    }

    #[test]
    fn test_cancelled_job_reports_nothing() {
        let bytes: Arc<[u8]> = fixtures::triangle_glb().into();
        let mut job = DecodeJob::spawn(bytes, None);
        job.cancel();
        assert!(job.is_finished());
        thread::sleep(Duration::from_millis(20));
        assert!(job.poll().is_empty());
    }
}

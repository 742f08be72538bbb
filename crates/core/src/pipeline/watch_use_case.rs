use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::overlay::domain::frame_renderer::FrameRenderer;
use crate::presence::domain::presence_tracker::PresenceEvent;
use crate::shared::clock::{ManualClock, Timestamp};
use crate::shared::error::SourceError;
use crate::video::domain::frame_source::FrameSource;

use super::frame_pipeline::FramePipeline;

/// Why the detection loop ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// A recorded file ran out of frames.
    EndOfStream,
    /// The cancel flag was raised.
    Cancelled,
    /// The configured frame limit was reached.
    FrameLimit,
    /// The source stopped delivering frames.
    SourceFailed(String),
}

/// Totals for one run of the detection loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchSummary {
    pub frames_processed: usize,
    /// Empty frames plus frames whose detection failed.
    pub frames_skipped: usize,
    pub events: Vec<PresenceEvent>,
    pub sink_failures: usize,
    pub stop_reason: StopReason,
}

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("could not open frame source: {0}")]
    Open(#[from] SourceError),
    #[error("watch already executed")]
    AlreadyExecuted,
}

/// Runs the capture → detect → track → render loop until the source ends,
/// the frame limit is hit, or the cancel flag is raised.
///
/// Single-use: `execute` consumes the frame source.
pub struct WatchUseCase {
    source: Option<Box<dyn FrameSource>>,
    pipeline: FramePipeline,
    renderer: Box<dyn FrameRenderer>,
    max_frames: Option<usize>,
    replay_clock: Option<ManualClock>,
    cancelled: Arc<AtomicBool>,
}

impl WatchUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        pipeline: FramePipeline,
        renderer: Box<dyn FrameRenderer>,
        max_frames: Option<usize>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            pipeline,
            renderer,
            max_frames,
            replay_clock: None,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Drives `clock` from frame positions when the source is a recording,
    /// so presence timeouts follow the footage rather than decode speed.
    ///
    /// The same clock must be the one owned by the pipeline.
    pub fn with_replay_clock(mut self, clock: ManualClock) -> Self {
        self.replay_clock = Some(clock);
        self
    }

    pub fn execute(&mut self) -> Result<WatchSummary, WatchError> {
        let mut source = self.source.take().ok_or(WatchError::AlreadyExecuted)?;
        let info = source.open()?;

        let replay = match (&self.replay_clock, info.live, info.frame_interval()) {
            (Some(clock), false, Some(interval)) => Some((clock.clone(), interval)),
            (Some(_), false, None) => {
                log::warn!("{} reports no frame rate; using wall time", info.source);
                None
            }
            _ => None,
        };

        self.pipeline.logger_mut().info(&format!(
            "Watching {} ({}x{})",
            info.source, info.width, info.height
        ));

        let mut summary = WatchSummary {
            frames_processed: 0,
            frames_skipped: 0,
            events: Vec::new(),
            sink_failures: 0,
            stop_reason: StopReason::EndOfStream,
        };

        let mut frames = source.frames();
        loop {
            // Both checks come before pulling, so a live device is never
            // asked for a frame that would be thrown away.
            if self.cancelled.load(Ordering::Relaxed) {
                summary.stop_reason = StopReason::Cancelled;
                break;
            }
            if self
                .max_frames
                .is_some_and(|max| summary.frames_processed >= max)
            {
                summary.stop_reason = StopReason::FrameLimit;
                break;
            }
            let Some(result) = frames.next() else {
                break;
            };

            let frame = match result {
                Ok(frame) => frame,
                Err(e) => {
                    log::error!("Frame source failed: {e}");
                    summary.stop_reason = StopReason::SourceFailed(e.to_string());
                    break;
                }
            };

            if frame.is_empty() {
                log::debug!("Skipping empty frame {}", frame.index());
                summary.frames_skipped += 1;
                continue;
            }

            if let Some((clock, interval)) = &replay {
                clock.set(Timestamp::from_duration(
                    interval.mul_f64(frame.index() as f64),
                ));
            }

            let outcome = match self.pipeline.process(&frame) {
                Ok(outcome) => outcome,
                Err(e) => {
                    log::warn!("Skipping frame {}: {e}", frame.index());
                    summary.frames_skipped += 1;
                    continue;
                }
            };
            summary.frames_processed += 1;

            if let Some(event) = outcome.event {
                summary.events.push(event);
            }
            if outcome.sink_failed {
                summary.sink_failures += 1;
            }

            if let Err(e) = self.renderer.render(&frame, &outcome.detections) {
                log::warn!("Render failed for frame {}: {e}", frame.index());
            }
        }

        drop(frames);
        source.close();
        self.pipeline.finish();
        log::info!(
            "Stopped after {} frames ({} skipped): {:?}",
            summary.frames_processed,
            summary.frames_skipped,
            summary.stop_reason
        );
        Ok(summary)
    }
}

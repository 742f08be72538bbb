use std::collections::BTreeMap;
use std::time::Instant;

use crate::detection::domain::detection_set::DetectionCounts;

/// Cross-cutting logger for per-frame telemetry.
///
/// Keeps the frame pipeline free of output concerns so the CLI, embedders
/// and tests can each observe it their own way.
pub trait PipelineLogger: Send {
    /// Report what one frame contained.
    fn frame(&mut self, index: usize, counts: &DetectionCounts);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. valid eyes, sink failures).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn frame(&mut self, _index: usize, _counts: &DetectionCounts) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running totals for one timed stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub calls: usize,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn add(&mut self, duration_ms: f64) {
        self.calls += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    pub fn avg_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_ms / self.calls as f64
        }
    }
}

/// Logger for the CLI watch loop.
///
/// Count lines go to `log::debug!`, a status line to `log::info!` every
/// `status_every` frames, and a short report when the loop ends.
pub struct StdoutPipelineLogger {
    status_every: usize,
    started: Instant,
    frames: usize,
    frames_with_faces: usize,
    stages: BTreeMap<String, StageStats>,
    totals: BTreeMap<String, f64>,
}

impl StdoutPipelineLogger {
    pub fn new(status_every: usize) -> Self {
        Self {
            status_every: status_every.max(1),
            started: Instant::now(),
            frames: 0,
            frames_with_faces: 0,
            stages: BTreeMap::new(),
            totals: BTreeMap::new(),
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.get(name)
    }

    /// Sum of every value recorded under `name`.
    pub fn total(&self, name: &str) -> f64 {
        self.totals.get(name).copied().unwrap_or(0.0)
    }

    /// End-of-run report, or `None` before the first frame.
    pub fn report(&self) -> Option<String> {
        if self.frames == 0 {
            return None;
        }
        let secs = self.started.elapsed().as_secs_f64();
        let mut report = format!(
            "Watched {} frame(s), {} with faces, in {secs:.1}s",
            self.frames, self.frames_with_faces
        );
        if secs > 0.0 {
            report.push_str(&format!(" ({:.1} fps)", self.frames as f64 / secs));
        }
        for (name, stats) in &self.stages {
            report.push_str(&format!(
                "\n  {name}: avg {:.1}ms, worst {:.1}ms",
                stats.avg_ms(),
                stats.max_ms
            ));
        }
        for (name, total) in &self.totals {
            report.push_str(&format!("\n  {name}: {total}"));
        }
        Some(report)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn frame(&mut self, index: usize, counts: &DetectionCounts) {
        self.frames += 1;
        if counts.frontal_faces + counts.profile_faces > 0 {
            self.frames_with_faces += 1;
        }
        log::debug!("Frame {index}: {counts}");
        if self.frames % self.status_every == 0 {
            log::info!(
                "Watched {} frames ({} with faces)",
                self.frames,
                self.frames_with_faces
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .add(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        *self.totals.entry(name.to_string()).or_default() += value;
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(report) = self.report() {
            log::info!("{report}");
        }
    }
}

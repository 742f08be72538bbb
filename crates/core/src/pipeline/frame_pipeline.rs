use std::time::Instant;

use crate::detection::domain::detection_params::DetectionParams;
use crate::detection::domain::detection_set::DetectionSet;
use crate::detection::domain::feature_detector::{DetectorBank, FeatureClass};
use crate::presence::domain::event_sink::EventSink;
use crate::presence::domain::presence_tracker::{PresenceEvent, PresencePhase, PresenceTracker};
use crate::shared::clock::Clock;
use crate::shared::error::{ConfigError, DetectorError};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

use super::pipeline_logger::PipelineLogger;

/// What one call to [`FramePipeline::process`] produced.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutcome {
    pub detections: DetectionSet,
    pub event: Option<PresenceEvent>,
    /// The event could not be written to the sink. It is not retried.
    pub sink_failed: bool,
}

/// Per-frame detection, correlation and presence tracking.
///
/// Owns every collaborator it touches, so the tracker state lives exactly as
/// long as the pipeline. Frames are handled one at a time on the caller's
/// thread.
pub struct FramePipeline {
    detectors: DetectorBank,
    face_params: DetectionParams,
    eye_params: DetectionParams,
    tracker: PresenceTracker,
    sink: Box<dyn EventSink>,
    clock: Box<dyn Clock>,
    logger: Box<dyn PipelineLogger>,
}

impl FramePipeline {
    /// Validates both parameter sets before any frame is seen.
    pub fn new(
        detectors: DetectorBank,
        face_params: DetectionParams,
        eye_params: DetectionParams,
        tracker: PresenceTracker,
        sink: Box<dyn EventSink>,
        clock: Box<dyn Clock>,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<Self, ConfigError> {
        face_params.validate("face")?;
        eye_params.validate("eye")?;
        Ok(Self {
            detectors,
            face_params,
            eye_params,
            tracker,
            sink,
            clock,
            logger,
        })
    }

    /// Runs all three detectors, correlates eyes with faces, feeds the
    /// tracker and forwards any resulting event to the sink.
    ///
    /// A detector failure returns before the tracker is touched, so a
    /// skipped frame leaves presence state exactly as it was.
    pub fn process(&mut self, frame: &Frame) -> Result<FrameOutcome, DetectorError> {
        frame.validate()?;

        let t0 = Instant::now();
        let frontal = self.detect(FeatureClass::FrontalFace, frame)?;
        let profile = self.detect(FeatureClass::ProfileFace, frame)?;
        let eyes = self.detect(FeatureClass::Eye, frame)?;
        let t_detect = t0.elapsed();

        let t1 = Instant::now();
        let detections = DetectionSet::new(frontal, profile, eyes);
        let t_correlate = t1.elapsed();

        let now = self.clock.now();
        let event = self.tracker.observe(detections.faces_seen(), now);

        let mut sink_failed = false;
        if let Some(event) = event {
            self.logger.info(&format!("Presence event: {event}"));
            if let Err(e) = self.sink.record(event, now) {
                log::warn!("Dropping {event} event: {e}");
                self.logger.metric("sink_failures", 1.0);
                sink_failed = true;
            }
        }

        let counts = detections.counts();
        self.logger.frame(frame.index(), &counts);
        self.logger.timing("detect", t_detect.as_secs_f64() * 1000.0);
        self.logger.timing("correlate", t_correlate.as_secs_f64() * 1000.0);
        self.logger.metric("valid_eyes", counts.valid_eyes as f64);

        Ok(FrameOutcome {
            detections,
            event,
            sink_failed,
        })
    }

    /// Current presence phase, for status displays.
    pub fn phase(&self) -> PresencePhase {
        self.tracker.phase()
    }

    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    pub fn logger_mut(&mut self) -> &mut dyn PipelineLogger {
        self.logger.as_mut()
    }

    /// Emits the logger's end-of-run summary.
    pub fn finish(&self) {
        self.logger.summary();
    }

    fn detect(&mut self, class: FeatureClass, frame: &Frame) -> Result<Vec<Rect>, DetectorError> {
        let params = match class {
            FeatureClass::Eye => &self.eye_params,
            FeatureClass::FrontalFace | FeatureClass::ProfileFace => &self.face_params,
        };
        self.detectors.detector_mut(class).detect(frame, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::detection::domain::detection_params::BoxSize;
    use crate::detection::domain::feature_detector::FeatureDetector;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::presence::domain::event_sink::MemoryEventSink;
    use crate::shared::clock::{ManualClock, MonotonicClock, Timestamp};
    use crate::shared::error::SinkError;

    // --- Stubs ---

    /// Returns the boxes scripted for each frame index.
    struct ScriptedDetector {
        script: HashMap<usize, Vec<Rect>>,
        seen_params: Arc<Mutex<Vec<DetectionParams>>>,
    }

    impl ScriptedDetector {
        fn boxed(script: &[(usize, Vec<Rect>)]) -> Box<dyn FeatureDetector> {
            Box::new(Self {
                script: script.iter().cloned().collect(),
                seen_params: Arc::new(Mutex::new(Vec::new())),
            })
        }
    }

    impl FeatureDetector for ScriptedDetector {
        fn detect(
            &mut self,
            frame: &Frame,
            params: &DetectionParams,
        ) -> Result<Vec<Rect>, DetectorError> {
            self.seen_params.lock().unwrap().push(params.clone());
            Ok(self.script.get(&frame.index()).cloned().unwrap_or_default())
        }
    }

    struct FailingDetector;

    impl FeatureDetector for FailingDetector {
        fn detect(&mut self, _: &Frame, _: &DetectionParams) -> Result<Vec<Rect>, DetectorError> {
            Err(DetectorError::Backend {
                class: "eye".to_string(),
                message: "boom".to_string(),
            })
        }
    }

    struct SharedSink(Arc<Mutex<MemoryEventSink>>);

    impl EventSink for SharedSink {
        fn record(&mut self, event: PresenceEvent, at: Timestamp) -> Result<(), SinkError> {
            self.0.lock().unwrap().record(event, at)
        }
    }

    struct BrokenSink;

    impl EventSink for BrokenSink {
        fn record(&mut self, _: PresenceEvent, _: Timestamp) -> Result<(), SinkError> {
            Err(SinkError::Io {
                path: "/full/disk.log".into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn frame(index: usize) -> Frame {
        Frame::new(vec![0; 4 * 4 * 3], 4, 4, 3, index)
    }

    fn face() -> Rect {
        Rect::new(0, 0, 100, 100)
    }

    fn pipeline(
        bank: DetectorBank,
        sink: Box<dyn EventSink>,
        clock: &ManualClock,
    ) -> FramePipeline {
        FramePipeline::new(
            bank,
            DetectionParams::faces(),
            DetectionParams::eyes(),
            PresenceTracker::new(Duration::from_secs(30)).unwrap(),
            sink,
            Box::new(clock.clone()),
            Box::new(NullPipelineLogger),
        )
        .unwrap()
    }

    fn empty_bank() -> DetectorBank {
        DetectorBank {
            frontal_face: ScriptedDetector::boxed(&[]),
            profile_face: ScriptedDetector::boxed(&[]),
            eye: ScriptedDetector::boxed(&[]),
        }
    }

    // --- Tests ---

    #[test]
    fn test_invalid_params_rejected_at_construction() {
        let mut eyes = DetectionParams::eyes();
        eyes.max_size = Some(BoxSize::new(10, 10));
        let result = FramePipeline::new(
            empty_bank(),
            DetectionParams::faces(),
            eyes,
            PresenceTracker::default(),
            Box::new(MemoryEventSink::new()),
            Box::new(ManualClock::new()),
            Box::new(NullPipelineLogger),
        );
        assert!(matches!(result, Err(ConfigError::InvalidParams { .. })));
    }

    #[test]
    fn test_each_class_gets_its_own_params() {
        let face_seen = Arc::new(Mutex::new(Vec::new()));
        let eye_seen = Arc::new(Mutex::new(Vec::new()));
        let bank = DetectorBank {
            frontal_face: Box::new(ScriptedDetector {
                script: HashMap::new(),
                seen_params: face_seen.clone(),
            }),
            profile_face: ScriptedDetector::boxed(&[]),
            eye: Box::new(ScriptedDetector {
                script: HashMap::new(),
                seen_params: eye_seen.clone(),
            }),
        };
        let clock = ManualClock::new();
        let mut p = pipeline(bank, Box::new(MemoryEventSink::new()), &clock);
        p.process(&frame(0)).unwrap();

        assert_eq!(face_seen.lock().unwrap()[0], DetectionParams::faces());
        assert_eq!(eye_seen.lock().unwrap()[0], DetectionParams::eyes());
    }

    #[test]
    fn test_valid_eyes_come_from_correlation() {
        let eye_in = Rect::new(10, 10, 20, 20);
        let eye_out = Rect::new(200, 200, 210, 210);
        let bank = DetectorBank {
            frontal_face: ScriptedDetector::boxed(&[(0, vec![face()])]),
            profile_face: ScriptedDetector::boxed(&[]),
            eye: ScriptedDetector::boxed(&[(0, vec![eye_in, eye_out])]),
        };
        let clock = ManualClock::new();
        let mut p = pipeline(bank, Box::new(MemoryEventSink::new()), &clock);
        let outcome = p.process(&frame(0)).unwrap();

        assert_eq!(outcome.detections.valid_eyes(), &[eye_in]);
        assert_eq!(outcome.detections.eyes().len(), 2);
        assert_eq!(outcome.event, None);
    }

    #[test]
    fn test_absence_and_regain_reach_the_sink() {
        // Face on frames 0 and 2, nothing on frame 1.
        let bank = DetectorBank {
            frontal_face: ScriptedDetector::boxed(&[(0, vec![face()])]),
            profile_face: ScriptedDetector::boxed(&[(2, vec![face()])]),
            eye: ScriptedDetector::boxed(&[]),
        };
        let events = Arc::new(Mutex::new(MemoryEventSink::new()));
        let clock = ManualClock::new();
        let mut p = pipeline(bank, Box::new(SharedSink(events.clone())), &clock);

        assert_eq!(p.process(&frame(0)).unwrap().event, None);
        clock.advance(Duration::from_secs(31));
        assert_eq!(
            p.process(&frame(1)).unwrap().event,
            Some(PresenceEvent::AbsenceConfirmed)
        );
        clock.advance(Duration::from_secs(1));
        assert_eq!(
            p.process(&frame(2)).unwrap().event,
            Some(PresenceEvent::PresenceRegained)
        );

        assert_eq!(
            events.lock().unwrap().events(),
            &[
                (PresenceEvent::AbsenceConfirmed, Timestamp::from_secs(31)),
                (PresenceEvent::PresenceRegained, Timestamp::from_secs(32)),
            ]
        );
    }

    #[test]
    fn test_detector_failure_leaves_tracker_untouched() {
        let bank = DetectorBank {
            frontal_face: ScriptedDetector::boxed(&[(0, vec![face()]), (1, vec![face()])]),
            profile_face: ScriptedDetector::boxed(&[]),
            eye: Box::new(FailingDetector),
        };
        let clock = ManualClock::new();
        let mut p = pipeline(bank, Box::new(MemoryEventSink::new()), &clock);
        let before = *p.tracker().state();

        assert!(p.process(&frame(0)).is_err());
        assert_eq!(*p.tracker().state(), before);
        assert_eq!(p.phase(), PresencePhase::NeverSeen);
    }

    #[test]
    fn test_phase_reads_present_after_a_face_under_a_live_clock() {
        let bank = DetectorBank {
            frontal_face: ScriptedDetector::boxed(&[(0, vec![face()])]),
            profile_face: ScriptedDetector::boxed(&[]),
            eye: ScriptedDetector::boxed(&[]),
        };
        let mut p = FramePipeline::new(
            bank,
            DetectionParams::faces(),
            DetectionParams::eyes(),
            PresenceTracker::new(Duration::from_secs(30)).unwrap(),
            Box::new(MemoryEventSink::new()),
            Box::new(MonotonicClock::new()),
            Box::new(NullPipelineLogger),
        )
        .unwrap();

        p.process(&frame(0)).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(p.phase(), PresencePhase::Present);

        p.process(&frame(1)).unwrap();
        assert_eq!(p.phase(), PresencePhase::AbsentPending);
    }

    #[test]
    fn test_malformed_frame_is_detector_error() {
        let clock = ManualClock::new();
        let mut p = pipeline(empty_bank(), Box::new(MemoryEventSink::new()), &clock);
        let empty = Frame::new(Vec::new(), 0, 0, 3, 7);
        assert!(matches!(
            p.process(&empty),
            Err(DetectorError::MalformedFrame { index: 7, .. })
        ));
    }

    #[test]
    fn test_sink_failure_is_reported_not_fatal() {
        let bank = DetectorBank {
            frontal_face: ScriptedDetector::boxed(&[(0, vec![face()])]),
            profile_face: ScriptedDetector::boxed(&[]),
            eye: ScriptedDetector::boxed(&[]),
        };
        let clock = ManualClock::new();
        let mut p = pipeline(bank, Box::new(BrokenSink), &clock);

        p.process(&frame(0)).unwrap();
        clock.advance(Duration::from_secs(30));
        let outcome = p.process(&frame(1)).unwrap();
        assert_eq!(outcome.event, Some(PresenceEvent::AbsenceConfirmed));
        assert!(outcome.sink_failed);

        // The tracker moved on; the lost event is not retried.
        clock.advance(Duration::from_secs(1));
        let outcome = p.process(&frame(2)).unwrap();
        assert_eq!(outcome.event, None);
        assert!(!outcome.sink_failed);
    }
}

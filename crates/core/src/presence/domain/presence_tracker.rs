use std::time::Duration;

use crate::shared::clock::Timestamp;
use crate::shared::constants::DEFAULT_PRESENCE_TIMEOUT;
use crate::shared::error::ConfigError;

/// Debounced transition produced by [`PresenceTracker::observe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresenceEvent {
    /// Faces have been missing for at least the configured timeout.
    AbsenceConfirmed,
    /// Faces are back after a confirmed absence.
    PresenceRegained,
}

impl PresenceEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PresenceEvent::AbsenceConfirmed => "absence_confirmed",
            PresenceEvent::PresenceRegained => "presence_regained",
        }
    }
}

impl std::fmt::Display for PresenceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Conceptual state, derived on demand from the stored facts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresencePhase {
    NeverSeen,
    Present,
    AbsentPending,
    AbsentConfirmed,
}

/// Minimal facts the tracker keeps between frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PresenceState {
    pub last_seen: Option<Timestamp>,
    pub absence_confirmed: bool,
    /// Whether the most recent observation contained a face.
    pub last_saw_faces: bool,
    pub timeout: Duration,
}

/// Turns per-frame "any face seen" signals into debounced presence events.
///
/// A miss shorter than the timeout is silent in both directions: it neither
/// confirms an absence nor produces a regained event when faces come back.
/// Each absence episode confirms at most once.
#[derive(Clone, Debug)]
pub struct PresenceTracker {
    state: PresenceState,
}

impl PresenceTracker {
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            state: PresenceState {
                last_seen: None,
                absence_confirmed: false,
                last_saw_faces: false,
                timeout,
            },
        })
    }

    pub fn state(&self) -> &PresenceState {
        &self.state
    }

    pub fn timeout(&self) -> Duration {
        self.state.timeout
    }

    /// Feeds one frame's presence signal.
    ///
    /// The next state is computed in full before it replaces the current
    /// one, so the two fields always change together.
    pub fn observe(&mut self, faces_seen: bool, now: Timestamp) -> Option<PresenceEvent> {
        let (next, event) = self.transition(faces_seen, now);
        self.state = next;
        event
    }

    fn transition(&self, faces_seen: bool, now: Timestamp) -> (PresenceState, Option<PresenceEvent>) {
        let mut next = self.state;
        next.last_saw_faces = faces_seen;

        if faces_seen {
            let event = next
                .absence_confirmed
                .then_some(PresenceEvent::PresenceRegained);
            next.absence_confirmed = false;
            next.last_seen = Some(now);
            return (next, event);
        }

        let Some(last_seen) = next.last_seen else {
            return (next, None);
        };

        // A clock that steps backwards yields zero elapsed, never a confirmation.
        let elapsed = now.saturating_since(last_seen);
        if elapsed >= next.timeout && !next.absence_confirmed {
            next.absence_confirmed = true;
            return (next, Some(PresenceEvent::AbsenceConfirmed));
        }
        (next, None)
    }

    /// Read-only view of where the tracker stands after the last observation.
    pub fn phase(&self) -> PresencePhase {
        match self.state {
            PresenceState {
                last_seen: None, ..
            } => PresencePhase::NeverSeen,
            PresenceState {
                absence_confirmed: true,
                ..
            } => PresencePhase::AbsentConfirmed,
            PresenceState {
                last_saw_faces: true,
                ..
            } => PresencePhase::Present,
            _ => PresencePhase::AbsentPending,
        }
    }
}

impl Default for PresenceTracker {
    fn default() -> Self {
        Self {
            state: PresenceState {
                last_seen: None,
                absence_confirmed: false,
                last_saw_faces: false,
                timeout: DEFAULT_PRESENCE_TIMEOUT,
            },
        }
    }
}

use crate::detection::domain::eye_correlator::correlate;
use crate::shared::rect::Rect;

/// Everything detected in one frame.
///
/// `valid_eyes` is derived from the other three collections at construction
/// and cannot be set independently.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionSet {
    frontal_faces: Vec<Rect>,
    profile_faces: Vec<Rect>,
    eyes: Vec<Rect>,
    valid_eyes: Vec<Rect>,
}

/// Per-frame box counts, for logging and metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionCounts {
    pub frontal_faces: usize,
    pub profile_faces: usize,
    pub eyes: usize,
    pub valid_eyes: usize,
}

impl std::fmt::Display for DetectionCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Found {} front face(s), {} side face(s), {} eye(s) ({} valid)",
            self.frontal_faces, self.profile_faces, self.eyes, self.valid_eyes
        )
    }
}

impl DetectionSet {
    pub fn new(frontal_faces: Vec<Rect>, profile_faces: Vec<Rect>, eyes: Vec<Rect>) -> Self {
        let valid_eyes = correlate(&eyes, &frontal_faces, &profile_faces);
        Self {
            frontal_faces,
            profile_faces,
            eyes,
            valid_eyes,
        }
    }

    pub fn frontal_faces(&self) -> &[Rect] {
        &self.frontal_faces
    }

    pub fn profile_faces(&self) -> &[Rect] {
        &self.profile_faces
    }

    pub fn eyes(&self) -> &[Rect] {
        &self.eyes
    }

    pub fn valid_eyes(&self) -> &[Rect] {
        &self.valid_eyes
    }

    /// All face boxes, frontal first.
    pub fn faces(&self) -> impl Iterator<Item = &Rect> {
        self.frontal_faces.iter().chain(self.profile_faces.iter())
    }

    pub fn faces_seen(&self) -> bool {
        !self.frontal_faces.is_empty() || !self.profile_faces.is_empty()
    }

    pub fn counts(&self) -> DetectionCounts {
        DetectionCounts {
            frontal_faces: self.frontal_faces.len(),
            profile_faces: self.profile_faces.len(),
            eyes: self.eyes.len(),
            valid_eyes: self.valid_eyes.len(),
        }
    }
}

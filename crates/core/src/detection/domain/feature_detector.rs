use crate::detection::domain::detection_params::DetectionParams;
use crate::shared::error::DetectorError;
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// The facial features searched for on every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    FrontalFace,
    ProfileFace,
    Eye,
}

impl FeatureClass {
    pub const ALL: [FeatureClass; 3] = [
        FeatureClass::FrontalFace,
        FeatureClass::ProfileFace,
        FeatureClass::Eye,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FeatureClass::FrontalFace => "frontal face",
            FeatureClass::ProfileFace => "profile face",
            FeatureClass::Eye => "eye",
        }
    }
}

impl std::fmt::Display for FeatureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Domain interface for a multi-scale object detector.
///
/// Results carry no ordering or uniqueness guarantee and may be empty.
/// Implementations may cache scratch buffers between calls, hence `&mut self`.
pub trait FeatureDetector: Send {
    fn detect(&mut self, frame: &Frame, params: &DetectionParams)
        -> Result<Vec<Rect>, DetectorError>;
}

/// One detector per feature class. Dropping the bank releases all of them.
pub struct DetectorBank {
    pub frontal_face: Box<dyn FeatureDetector>,
    pub profile_face: Box<dyn FeatureDetector>,
    pub eye: Box<dyn FeatureDetector>,
}

impl DetectorBank {
    pub fn detector_mut(&mut self, class: FeatureClass) -> &mut dyn FeatureDetector {
        match class {
            FeatureClass::FrontalFace => self.frontal_face.as_mut(),
            FeatureClass::ProfileFace => self.profile_face.as_mut(),
            FeatureClass::Eye => self.eye.as_mut(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<Rect>);

    impl FeatureDetector for Fixed {
        fn detect(
            &mut self,
            _frame: &Frame,
            _params: &DetectionParams,
        ) -> Result<Vec<Rect>, DetectorError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_bank_routes_by_class() {
        let mut bank = DetectorBank {
            frontal_face: Box::new(Fixed(vec![Rect::new(0, 0, 1, 1)])),
            profile_face: Box::new(Fixed(vec![])),
            eye: Box::new(Fixed(vec![Rect::new(0, 0, 2, 2), Rect::new(1, 1, 3, 3)])),
        };
        let frame = Frame::new(vec![0u8; 3], 1, 1, 3, 0);
        let params = DetectionParams::faces();

        let counts: Vec<usize> = FeatureClass::ALL
            .iter()
            .map(|&c| bank.detector_mut(c).detect(&frame, &params).unwrap().len())
            .collect();
        assert_eq!(counts, vec![1, 0, 2]);
    }

    #[test]
    fn test_class_names() {
        assert_eq!(FeatureClass::ProfileFace.to_string(), "profile face");
    }
}

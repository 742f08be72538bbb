use crate::shared::rect::Rect;

/// Keeps only the eyes that sit inside a detected face.
///
/// Frontal faces are searched first; profile faces only when no frontal
/// face holds the eye. Which face matched does not matter, so the search
/// stops at the first hit. Output preserves the input eye order.
pub fn correlate(eyes: &[Rect], frontal_faces: &[Rect], profile_faces: &[Rect]) -> Vec<Rect> {
    eyes.iter()
        .filter(|eye| {
            frontal_faces.iter().any(|face| face.contains(eye))
                || profile_faces.iter().any(|face| face.contains(eye))
        })
        .copied()
        .collect()
}

use std::path::PathBuf;

use crate::detection::domain::feature_detector::{DetectorBank, FeatureClass};
use crate::detection::infrastructure::cascade_resolver::CascadeResolver;
use crate::shared::constants::{EYE_CASCADE, FRONTAL_FACE_CASCADE, PROFILE_FACE_CASCADE};
use crate::shared::error::ConfigError;

pub fn cascade_file(class: FeatureClass) -> &'static str {
    match class {
        FeatureClass::FrontalFace => FRONTAL_FACE_CASCADE,
        FeatureClass::ProfileFace => PROFILE_FACE_CASCADE,
        FeatureClass::Eye => EYE_CASCADE,
    }
}

/// Resolves the cascade file for every feature class, in load order.
pub fn resolve_cascades(
    resolver: &CascadeResolver,
) -> Result<Vec<(FeatureClass, PathBuf)>, ConfigError> {
    FeatureClass::ALL
        .iter()
        .map(|&class| {
            let name = cascade_file(class);
            resolver
                .resolve(name)
                .map(|path| (class, path))
                .map_err(|source| ConfigError::Resolve {
                    name: name.to_string(),
                    source,
                })
        })
        .collect()
}

/// Loads the frontal, profile and eye classifiers.
///
/// If any load fails, the classifiers loaded before it are dropped (and
/// released) before the error is returned.
#[cfg(feature = "opencv")]
pub fn load_cascade_bank(resolver: &CascadeResolver) -> Result<DetectorBank, ConfigError> {
    use crate::detection::infrastructure::cascade_detector::CascadeDetector;

    let paths = resolve_cascades(resolver)?;
    let path_for = |class: FeatureClass| {
        paths
            .iter()
            .find(|(c, _)| *c == class)
            .map(|(_, p)| p.clone())
            .ok_or(ConfigError::DetectorUnavailable)
    };

    let frontal_face = CascadeDetector::load(
        FeatureClass::FrontalFace,
        &path_for(FeatureClass::FrontalFace)?,
    )?;
    let profile_face = CascadeDetector::load(
        FeatureClass::ProfileFace,
        &path_for(FeatureClass::ProfileFace)?,
    )?;
    let eye = CascadeDetector::load(FeatureClass::Eye, &path_for(FeatureClass::Eye)?)?;

    log::info!("Loaded frontal face, profile face and eye cascades");
    Ok(DetectorBank {
        frontal_face: Box::new(frontal_face),
        profile_face: Box::new(profile_face),
        eye: Box::new(eye),
    })
}

#[cfg(not(feature = "opencv"))]
pub fn load_cascade_bank(_resolver: &CascadeResolver) -> Result<DetectorBank, ConfigError> {
    Err(ConfigError::DetectorUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cascade_file_names() {
        assert_eq!(
            cascade_file(FeatureClass::FrontalFace),
            "haarcascade_frontalface_default.xml"
        );
        assert_eq!(
            cascade_file(FeatureClass::ProfileFace),
            "haarcascade_profileface.xml"
        );
        assert_eq!(cascade_file(FeatureClass::Eye), "haarcascade_eye.xml");
    }

    #[test]
    fn test_resolve_cascades_in_class_order() {
        let tmp = TempDir::new().unwrap();
        for class in FeatureClass::ALL {
            fs::write(tmp.path().join(cascade_file(class)), b"<opencv_storage/>").unwrap();
        }
        let resolver =
            CascadeResolver::new(Some(tmp.path().to_path_buf()), tmp.path().join("cache")).offline();

        let resolved = resolve_cascades(&resolver).unwrap();
        let classes: Vec<FeatureClass> = resolved.iter().map(|(c, _)| *c).collect();
        assert_eq!(classes, FeatureClass::ALL.to_vec());
        assert!(resolved.iter().all(|(_, p)| p.starts_with(tmp.path())));
    }

    #[test]
    fn test_missing_cascade_is_config_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(FRONTAL_FACE_CASCADE), b"<opencv_storage/>").unwrap();
        let resolver =
            CascadeResolver::new(Some(tmp.path().to_path_buf()), tmp.path().join("cache")).offline();

        let err = resolve_cascades(&resolver).unwrap_err();
        assert!(
            matches!(err, ConfigError::Resolve { ref name, .. } if name == PROFILE_FACE_CASCADE)
        );
    }

    #[cfg(feature = "opencv")]
    #[test]
    fn test_bank_rejects_unreadable_cascades() {
        let tmp = TempDir::new().unwrap();
        for class in FeatureClass::ALL {
            fs::write(tmp.path().join(cascade_file(class)), b"not a cascade").unwrap();
        }
        let resolver =
            CascadeResolver::new(Some(tmp.path().to_path_buf()), tmp.path().join("cache")).offline();
        assert!(matches!(
            load_cascade_bank(&resolver),
            Err(ConfigError::ClassifierLoad { .. } | ConfigError::Backend { .. })
        ));
    }

    #[cfg(not(feature = "opencv"))]
    #[test]
    fn test_bank_unavailable_without_backend() {
        let tmp = TempDir::new().unwrap();
        let resolver = CascadeResolver::new(None, tmp.path().to_path_buf()).offline();
        assert!(matches!(
            load_cascade_bank(&resolver),
            Err(ConfigError::DetectorUnavailable)
        ));
    }
}

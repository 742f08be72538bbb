pub mod detection_params;
pub mod detection_set;
pub mod eye_correlator;
pub mod feature_detector;

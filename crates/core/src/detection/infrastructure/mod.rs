pub mod cascade_bank;
#[cfg(feature = "opencv")]
pub mod cascade_detector;
pub mod cascade_resolver;

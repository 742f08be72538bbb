pub mod clock;
pub mod constants;
pub mod error;
pub mod frame;
pub mod rect;
pub mod stream_info;

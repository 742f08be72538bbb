pub mod frame_pipeline;
pub mod pipeline_logger;
pub mod watch_use_case;

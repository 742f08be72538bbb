pub mod box_painter;
pub mod frame_renderer;

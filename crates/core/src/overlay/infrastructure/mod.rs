pub mod snapshot_renderer;

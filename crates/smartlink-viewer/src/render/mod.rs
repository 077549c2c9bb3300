pub mod globe;
pub mod scene;

pub use globe::{orbit_camera, setup_scene};
pub use scene::{apply_picked, draw_labels, draw_scene, hover_detection, picking};

pub mod help;
pub mod hud;
pub mod shortcuts;
pub mod toolbar;
pub mod tooltips;

use bevy::prelude::Resource;

use crate::util::config::ViewerConfig;

pub use help::help_overlay;
pub use hud::hud_overlay;
pub use shortcuts::handle_shortcuts;
pub use toolbar::{timeline_overlay, toolbar_overlay};

pub const HUD_EDGE_PADDING: f32 = 8.0;
pub const HUD_TOP_OFFSET: f32 = 40.0;

/// Overlay toggles; nothing here touches the scene.
#[derive(Resource, Debug, Clone, Copy)]
pub struct UiState {
    pub help_open: bool,
    pub show_hud: bool,
}

impl UiState {
    pub fn from_config(cfg: &ViewerConfig) -> Self {
        Self {
            help_open: false,
            show_hud: cfg.show_hud,
        }
    }
}

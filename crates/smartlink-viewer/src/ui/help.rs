use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};

use crate::ui::UiState;

pub fn help_overlay(mut contexts: EguiContexts, ui_state: Res<UiState>) {
    if !ui_state.help_open {
        return;
    }

    egui::Window::new("Help / Shortcuts")
        .collapsible(false)
        .resizable(false)
        .show(contexts.ctx_mut(), |ui| {
            ui.label("Space: play / pause the clock");
            ui.label("R: reset the clock to the ephemeris start");
            ui.label("H: toggle the status overlay");
            ui.label("Esc: clear hover, close help");
            ui.label("?: toggle help");
            ui.separator();
            ui.label("Right drag: rotate globe");
            ui.label("Wheel: zoom");
            ui.label("Left click: select a satellite");
        });
}

use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};

use crate::scene::SceneCoordinator;
use crate::ui::UiState;

pub fn handle_shortcuts(
    mut contexts: EguiContexts,
    mut ui_state: ResMut<UiState>,
    mut scene: ResMut<SceneCoordinator>,
) {
    let ctx = contexts.ctx_mut();
    if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        ui_state.help_open = false;
        if scene.hovered().is_some() {
            scene.hover(None);
        }
    }

    if ctx.wants_keyboard_input() {
        return;
    }

    if ctx.input(|i| i.key_pressed(egui::Key::Questionmark)) {
        ui_state.help_open = !ui_state.help_open;
    }
    if ctx.input(|i| i.key_pressed(egui::Key::H)) {
        ui_state.show_hud = !ui_state.show_hud;
    }
    if ctx.input(|i| i.key_pressed(egui::Key::R)) {
        scene.reset_clock();
    }
    if ctx.input(|i| i.key_pressed(egui::Key::Space)) {
        let animating = scene
            .viewer()
            .is_some_and(|v| v.clock.should_animate);
        scene.set_animating(!animating);
    }
}

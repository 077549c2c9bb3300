use bevy::prelude::Res;
use bevy_egui::{egui, EguiContexts};
use chrono::SecondsFormat;

use crate::scene::SceneCoordinator;
use crate::store::MissionStore;
use crate::ui::{UiState, HUD_EDGE_PADDING, HUD_TOP_OFFSET};

pub fn hud_overlay(
    mut contexts: EguiContexts,
    ui_state: Res<UiState>,
    store: Res<MissionStore>,
    scene: Res<SceneCoordinator>,
) {
    if !ui_state.show_hud {
        return;
    }
    let ctx = contexts.ctx_mut();
    let screen = ctx.screen_rect();
    let pos = egui::pos2(
        screen.min.x + HUD_EDGE_PADDING,
        screen.min.y + HUD_TOP_OFFSET + HUD_EDGE_PADDING,
    );

    egui::Area::new("hud".into())
        .order(egui::Order::Foreground)
        .fixed_pos(pos)
        .show(ctx, |ui| {
            ui.group(|ui| {
                let status = &store.status;
                ui.label(format!(
                    "Feed: {} ({})",
                    status.endpoint.as_deref().unwrap_or("none"),
                    if status.connected {
                        "connected"
                    } else {
                        "offline"
                    }
                ));
                if let Some(version) = status.server_version.as_deref() {
                    ui.label(format!("Server: {version}"));
                }
                ui.label(format!(
                    "Snapshots: {}  Events: {}",
                    status.snapshots, status.events
                ));
                if let Some(err) = status.last_error.as_deref() {
                    ui.colored_label(egui::Color32::LIGHT_RED, format!("Last error: {err}"));
                }

                let Some(viewer) = scene.viewer() else {
                    ui.label("Scene not mounted");
                    return;
                };
                if let Some(system) = store.system() {
                    ui.label(format!("System: {}", system.name));
                }
                ui.label(format!(
                    "Stations: {}  Satellites: {}",
                    store.stations().len(),
                    scene.satellite_count()
                ));
                ui.label(format!(
                    "Eligibility windows: {}",
                    store.eligibility_count()
                ));
                ui.label(format!("Entities: {}", viewer.entity_count()));
                ui.label(format!(
                    "Time: {}{}",
                    viewer
                        .clock
                        .current_time
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                    if viewer.clock.should_animate {
                        ""
                    } else {
                        " (paused)"
                    }
                ));
            });
        });
}

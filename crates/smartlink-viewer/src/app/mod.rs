use bevy::app::AppExit;
use bevy::prelude::*;

use crate::app::events::Picked;
use crate::app::resources::{NetRx, Reader, ViewerSettings};
use crate::scene::SceneCoordinator;
use crate::store::MissionStore;
use crate::ui::UiState;
use crate::util::config::ViewerConfig;

pub mod events;
pub mod resources;

pub struct SmartLinkViewerPlugin {
    pub config: ViewerConfig,
}

impl Plugin for SmartLinkViewerPlugin {
    fn build(&self, app: &mut App) {
        let scene = SceneCoordinator::mount(self.config.scene_settings());
        app.add_event::<Picked>()
            .insert_resource(ViewerSettings(self.config.clone()))
            .insert_resource(UiState::from_config(&self.config))
            .insert_resource(MissionStore::default())
            .insert_resource(scene)
            .add_systems(Startup, crate::render::setup_scene)
            .add_systems(
                Update,
                (
                    pump_network,
                    tick_clock,
                    crate::ui::handle_shortcuts,
                    crate::ui::toolbar_overlay,
                    crate::ui::timeline_overlay,
                    crate::ui::help_overlay,
                    crate::ui::hud_overlay,
                    crate::render::orbit_camera,
                    crate::render::hover_detection,
                    crate::render::picking,
                    crate::render::apply_picked,
                    crate::render::draw_scene,
                    crate::render::draw_labels,
                    shutdown,
                )
                    .chain(),
            );
    }
}

fn pump_network(
    mut store: ResMut<MissionStore>,
    mut scene: ResMut<SceneCoordinator>,
    rx: Option<Res<NetRx>>,
) {
    let Some(rx) = rx else {
        return;
    };
    for msg in rx.0.try_iter().take(1_000) {
        store.handle(msg, &mut scene);
    }
}

fn tick_clock(time: Res<Time>, mut scene: ResMut<SceneCoordinator>) {
    scene.tick(time.delta_seconds_f64());
}

fn shutdown(
    mut exit: EventReader<AppExit>,
    mut scene: ResMut<SceneCoordinator>,
    mut settings: ResMut<ViewerSettings>,
    reader: Option<Res<Reader>>,
) {
    if exit.read().next().is_none() {
        return;
    }
    if let Some(reader) = reader {
        reader.0.stop();
    }

    let multiplier = scene.settings().clock_multiplier;
    if multiplier != settings.0.clock_multiplier {
        settings.0.clock_multiplier = multiplier;
        if let Err(e) = crate::util::config::save(&settings.0) {
            tracing::warn!(error = %e, "failed to save viewer config");
        }
    }
    scene.dispose();
}

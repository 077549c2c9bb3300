mod app;
mod net;
mod render;
mod scene;
mod store;
mod ui;
mod util;

use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use tracing_subscriber::EnvFilter;

use app::resources::{NetRx, Reader};
use app::SmartLinkViewerPlugin;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("smartlink=info,wgpu=error"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() {
    init_tracing();
    let config = util::config::load_or_default();

    let (tx, rx) = crossbeam_channel::unbounded();
    let reader = if config.feed.auto_connect {
        let path = config.feed.socket_path().to_string();
        tracing::info!(name = %config.feed.name, %path, "connecting to mission feed");
        Some(net::spawn_reader(path, tx))
    } else {
        tracing::info!("feed auto-connect disabled");
        None
    };

    let mut app = App::new();
    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "SmartLink".into(),
                    ..default()
                }),
                ..default()
            })
            .disable::<bevy::log::LogPlugin>(),
    )
    .add_plugins(EguiPlugin)
    .add_plugins(SmartLinkViewerPlugin { config })
    .insert_resource(NetRx(rx));
    if let Some(reader) = reader {
        app.insert_resource(Reader(reader));
    }
    app.run();
}

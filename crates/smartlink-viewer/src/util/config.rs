use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::scene::SceneSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeedEndpointKind {
    UdsPath(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedEndpoint {
    pub name: String,
    pub kind: FeedEndpointKind,
    pub auto_connect: bool,
}

impl Default for FeedEndpoint {
    fn default() -> Self {
        Self {
            name: "local".to_string(),
            kind: FeedEndpointKind::UdsPath(default_uds_path()),
            auto_connect: true,
        }
    }
}

impl FeedEndpoint {
    pub fn socket_path(&self) -> &str {
        match &self.kind {
            FeedEndpointKind::UdsPath(path) => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub feed: FeedEndpoint,
    pub clock_multiplier: f64,
    pub satellite_pixel_size: f32,
    pub station_pixel_size: f32,
    pub hover_pixel_size: f32,
    pub link_width: f32,
    pub pick_radius_px: f32,
    /// Metres per render unit.
    pub scene_scale: f64,
    pub defer_dependent_layers: bool,
    pub show_hud: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            feed: FeedEndpoint::default(),
            clock_multiplier: 60.0,
            satellite_pixel_size: 10.0,
            station_pixel_size: 12.0,
            hover_pixel_size: 16.0,
            link_width: 2.0,
            pick_radius_px: 14.0,
            scene_scale: 1_000_000.0,
            defer_dependent_layers: true,
            show_hud: true,
        }
    }
}

impl ViewerConfig {
    pub fn scene_settings(&self) -> SceneSettings {
        SceneSettings {
            satellite_pixel_size: self.satellite_pixel_size,
            station_pixel_size: self.station_pixel_size,
            hover_pixel_size: self.hover_pixel_size,
            link_width: self.link_width,
            clock_multiplier: self.clock_multiplier,
            defer_dependent_layers: self.defer_dependent_layers,
        }
    }
}

pub fn default_uds_path() -> String {
    static CACHED: OnceLock<String> = OnceLock::new();
    CACHED
        .get_or_init(|| {
            if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
                format!("{dir}/smartlink.sock")
            } else {
                "/tmp/smartlink.sock".to_string()
            }
        })
        .clone()
}

fn config_file_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "smartlink")?;
    Some(proj.config_dir().join("viewer.toml"))
}

pub fn load_or_default() -> ViewerConfig {
    let Some(path) = config_file_path() else {
        return ViewerConfig::default();
    };
    load_or_default_from_path(&path)
}

fn load_or_default_from_path(path: &Path) -> ViewerConfig {
    let Ok(contents) = fs::read_to_string(path) else {
        return ViewerConfig::default();
    };
    toml::from_str(&contents).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "invalid viewer config, using defaults");
        ViewerConfig::default()
    })
}

pub fn save(cfg: &ViewerConfig) -> anyhow::Result<()> {
    let Some(path) = config_file_path() else {
        return Err(anyhow::anyhow!("no config directory available"));
    };
    save_to_path(cfg, &path)
}

fn save_to_path(cfg: &ViewerConfig, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let data = toml::to_string_pretty(cfg).context("failed to serialize viewer config")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write viewer config {}", path.display()))?;
    Ok(())
}

use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::math::EulerRot;
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::app::resources::ViewerSettings;
use crate::util::geo::EARTH_RADIUS_M;

const EARTH_COLOR: Color = Color::srgb(0.08, 0.16, 0.32);
const ROTATE_SPEED: f32 = 0.005;
const ZOOM_STEP: f32 = 0.1;

/// Camera orbiting the globe centre, distance in render units.
#[derive(Component, Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(earth_radius: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.4,
            distance: earth_radius * 4.0,
            min_distance: earth_radius * 1.2,
            max_distance: earth_radius * 40.0,
        }
    }

    pub fn rotate(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ROTATE_SPEED;
        self.pitch = (self.pitch + delta.y * ROTATE_SPEED).clamp(-1.5, 1.5);
    }

    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * ZOOM_STEP).max(0.1);
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    pub fn transform(&self) -> Transform {
        let rotation = Quat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0);
        let eye = rotation * (Vec3::Z * self.distance);
        Transform::from_translation(eye).looking_at(Vec3::ZERO, Vec3::Y)
    }
}

pub fn earth_radius_units(scene_scale: f64) -> f32 {
    (EARTH_RADIUS_M / scene_scale) as f32
}

pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<StandardMaterial>>,
    settings: Res<ViewerSettings>,
) {
    let radius = earth_radius_units(settings.0.scene_scale);

    commands.spawn(DirectionalLightBundle {
        directional_light: DirectionalLight {
            illuminance: 8000.0,
            ..default()
        },
        transform: Transform::from_xyz(radius * 10.0, radius * 6.0, radius * 10.0)
            .looking_at(Vec3::ZERO, Vec3::Y),
        ..default()
    });

    commands.spawn(PbrBundle {
        mesh: meshes.add(Sphere::new(radius).mesh().uv(64, 32)),
        material: mats.add(StandardMaterial {
            base_color: EARTH_COLOR,
            perceptual_roughness: 0.9,
            ..default()
        }),
        ..default()
    });

    let orbit = OrbitCamera::new(radius);
    commands.spawn((
        Camera3dBundle {
            transform: orbit.transform(),
            ..default()
        },
        orbit,
    ));
}

/// Right drag rotates, wheel zooms.
pub fn orbit_camera(
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    mut contexts: EguiContexts,
    mut cam_q: Query<(&mut Transform, &mut OrbitCamera)>,
) {
    let egui_busy = contexts.ctx_mut().wants_pointer_input();
    let drag: Vec2 = motion.read().map(|ev| ev.delta).sum();
    let scroll: f32 = wheel.read().map(|ev| ev.y).sum();
    if egui_busy {
        return;
    }
    let Ok((mut tf, mut orbit)) = cam_q.get_single_mut() else {
        return;
    };

    let mut changed = false;
    if buttons.pressed(MouseButton::Right) && drag != Vec2::ZERO {
        orbit.rotate(drag);
        changed = true;
    }
    if scroll != 0.0 {
        orbit.zoom(scroll);
        changed = true;
    }
    if changed {
        *tf = orbit.transform();
    }
}

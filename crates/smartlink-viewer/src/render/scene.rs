use bevy::math::DVec3;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::app::events::Picked;
use crate::app::resources::ViewerSettings;
use crate::render::globe::earth_radius_units;
use crate::scene::{EntityKey, EntityRef, SceneCoordinator};
use crate::ui::tooltips::{render_tooltip, satellite_tooltip_lines};
use crate::util::geo::ecef_to_world;

const LABEL_OFFSET: egui::Vec2 = egui::vec2(12.0, -8.0);

/// Nearest candidate to `cursor`, strictly within `radius` pixels.
pub fn nearest_within(
    cursor: Vec2,
    candidates: impl IntoIterator<Item = (EntityRef, Vec2)>,
    radius: f32,
) -> Option<EntityRef> {
    let mut best: Option<(f32, EntityRef)> = None;
    for (r, screen) in candidates {
        let d = screen.distance(cursor);
        if d < radius && best.as_ref().map(|(bd, _)| d < *bd).unwrap_or(true) {
            best = Some((d, r));
        }
    }
    best.map(|(_, r)| r)
}

/// True when the globe sits between `eye` and `p`.
pub fn occluded_by_earth(eye: Vec3, p: Vec3, radius: f32) -> bool {
    let seg = p - eye;
    let len2 = seg.length_squared();
    if len2 <= f32::EPSILON {
        return false;
    }
    let t = (-eye.dot(seg) / len2).clamp(0.0, 1.0);
    let closest = eye + seg * t;
    // Slightly shrunk so ground stations stay visible.
    closest.length() < radius * 0.995 && t < 1.0
}

/// World units covered by one pixel at `distance` from the camera.
fn world_per_pixel(distance: f32, fov_y: f32, viewport_h: f32) -> f32 {
    if viewport_h <= 0.0 {
        return 0.0;
    }
    2.0 * distance * (fov_y * 0.5).tan() / viewport_h
}

fn to_world(p: DVec3, settings: &ViewerSettings) -> Vec3 {
    ecef_to_world(p, settings.0.scene_scale)
}

/// Screen positions of the currently visible points, occluded ones excluded.
fn screen_points(
    scene: &SceneCoordinator,
    settings: &ViewerSettings,
    camera: &Camera,
    cam_tf: &GlobalTransform,
) -> Vec<(EntityRef, Vec2)> {
    let eye = cam_tf.translation();
    let radius = earth_radius_units(settings.0.scene_scale);
    scene
        .frame()
        .points
        .iter()
        .filter_map(|p| {
            let world = to_world(p.position, settings);
            if occluded_by_earth(eye, world, radius) {
                return None;
            }
            let screen = camera.world_to_viewport(cam_tf, world)?;
            Some((p.entity, screen))
        })
        .collect()
}

pub fn hover_detection(
    windows: Query<&Window>,
    cam_q: Query<(&Camera, &GlobalTransform)>,
    mut contexts: EguiContexts,
    settings: Res<ViewerSettings>,
    mut scene: ResMut<SceneCoordinator>,
) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        if scene.hovered().is_some() {
            scene.hover(None);
        }
        return;
    };
    let Ok((camera, cam_tf)) = cam_q.get_single() else {
        return;
    };
    if contexts.ctx_mut().wants_pointer_input() {
        return;
    }

    let candidates = screen_points(&scene, &settings, camera, cam_tf);
    let picked = nearest_within(cursor, candidates, settings.0.pick_radius_px);
    if picked != scene.hovered() {
        scene.hover(picked);
    }
}

pub fn picking(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window>,
    cam_q: Query<(&Camera, &GlobalTransform)>,
    mut contexts: EguiContexts,
    settings: Res<ViewerSettings>,
    scene: Res<SceneCoordinator>,
    mut out: EventWriter<Picked>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    if contexts.ctx_mut().wants_pointer_input() {
        return;
    }

    let Ok(window) = windows.get_single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let Ok((camera, cam_tf)) = cam_q.get_single() else {
        return;
    };

    let candidates = screen_points(&scene, &settings, camera, cam_tf);
    if let Some(picked) = nearest_within(cursor, candidates, settings.0.pick_radius_px) {
        out.send(Picked(picked));
    }
}

pub fn apply_picked(mut scene: ResMut<SceneCoordinator>, mut ev: EventReader<Picked>) {
    for Picked(r) in ev.read() {
        if let Some(selected) = scene.click(Some(*r)) {
            tracing::debug!(entity = %r.key, selected, "selection toggled");
        }
    }
}

pub fn draw_scene(
    scene: Res<SceneCoordinator>,
    settings: Res<ViewerSettings>,
    windows: Query<&Window>,
    cam_q: Query<(&Projection, &GlobalTransform), With<Camera>>,
    mut gizmos: Gizmos,
) {
    let Ok((projection, cam_tf)) = cam_q.get_single() else {
        return;
    };
    let fov = match projection {
        Projection::Perspective(p) => p.fov,
        Projection::Orthographic(_) => std::f32::consts::FRAC_PI_4,
    };
    let viewport_h = windows.get_single().map(|w| w.height()).unwrap_or(720.0);
    let eye = cam_tf.translation();

    let frame = scene.frame();
    for line in &frame.lines {
        let (a, b) = (to_world(line.from, &settings), to_world(line.to, &settings));
        gizmos.line(a, b, line.color);
    }
    for point in &frame.points {
        let pos = to_world(point.position, &settings);
        let px = world_per_pixel(pos.distance(eye), fov, viewport_h);
        gizmos.sphere(pos, Quat::IDENTITY, point.pixel_size * 0.5 * px, point.color);
    }
}

/// Shown labels next to their point, plus the hovered satellite's details.
pub fn draw_labels(
    mut contexts: EguiContexts,
    settings: Res<ViewerSettings>,
    cam_q: Query<(&Camera, &GlobalTransform)>,
    scene: Res<SceneCoordinator>,
) {
    let Ok((camera, cam_tf)) = cam_q.get_single() else {
        return;
    };
    let ctx = contexts.ctx_mut();
    let eye = cam_tf.translation();
    let radius = earth_radius_units(settings.0.scene_scale);

    for point in scene.frame().points {
        let Some(text) = point.label else {
            continue;
        };
        let world = to_world(point.position, &settings);
        if occluded_by_earth(eye, world, radius) {
            continue;
        }
        let Some(screen) = camera.world_to_viewport(cam_tf, world) else {
            continue;
        };
        egui::Area::new(egui::Id::new(("label", point.entity.key.to_string())))
            .order(egui::Order::Middle)
            .interactable(false)
            .fixed_pos(egui::pos2(screen.x, screen.y) + LABEL_OFFSET)
            .show(ctx, |ui| {
                ui.label(egui::RichText::new(text).color(egui::Color32::WHITE));
            });
    }

    let Some(hovered) = scene.hovered() else {
        return;
    };
    let EntityKey::Satellite(id) = hovered.key else {
        return;
    };
    let (Some(details), Some(viewer)) = (scene.satellite_details(id), scene.viewer()) else {
        return;
    };
    let pos = ctx.input(|i| i.pointer.hover_pos().unwrap_or(egui::pos2(0.0, 0.0)))
        + egui::vec2(14.0, 14.0);
    let lines = satellite_tooltip_lines(id, details, viewer.clock.current_time);
    render_tooltip(ctx, "tooltip_satellite", pos, lines);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sat(id: u64) -> EntityRef {
        EntityRef::satellite(1, id)
    }

    #[test]
    fn nearest_within_radius_wins() {
        let cursor = Vec2::new(100.0, 100.0);
        let picked = nearest_within(
            cursor,
            [
                (sat(1), Vec2::new(110.0, 100.0)),
                (sat(2), Vec2::new(104.0, 103.0)),
                (sat(3), Vec2::new(300.0, 300.0)),
            ],
            14.0,
        );
        assert_eq!(picked, Some(sat(2)));
        assert_eq!(nearest_within(cursor, [(sat(3), Vec2::ZERO)], 14.0), None);
    }

    #[test]
    fn far_side_of_globe_is_occluded() {
        let eye = Vec3::new(0.0, 0.0, 30.0);
        assert!(occluded_by_earth(eye, Vec3::new(0.0, 0.0, -7.0), 6.4));
        assert!(!occluded_by_earth(eye, Vec3::new(0.0, 0.0, 7.0), 6.4));
        // Off to the side of the limb.
        assert!(!occluded_by_earth(eye, Vec3::new(8.0, 0.0, -1.0), 6.4));
    }

    #[test]
    fn pixel_scale_grows_with_distance() {
        let near = world_per_pixel(10.0, 0.8, 720.0);
        let far = world_per_pixel(20.0, 0.8, 720.0);
        assert!((far - 2.0 * near).abs() < 1e-6);
        assert_eq!(world_per_pixel(10.0, 0.8, 0.0), 0.0);
    }
}

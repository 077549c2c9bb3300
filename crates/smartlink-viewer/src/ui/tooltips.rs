use bevy_egui::egui;
use chrono::{DateTime, Utc};
use smartlink_core::SatelliteId;

use crate::scene::satellites::SatelliteDetails;

pub fn render_tooltip(
    ctx: &egui::Context,
    id: &str,
    pos: egui::Pos2,
    lines: impl IntoIterator<Item = String>,
) {
    egui::Area::new(egui::Id::new(id))
        .order(egui::Order::Tooltip)
        .fixed_pos(pos)
        .show(ctx, |ui| {
            ui.group(|ui| {
                for line in lines {
                    ui.label(line);
                }
            });
        });
}

pub fn satellite_tooltip_lines(
    id: SatelliteId,
    details: &SatelliteDetails,
    t: DateTime<Utc>,
) -> Vec<String> {
    let orbit = &details.orbit;
    let mut lines = vec![
        format!("Satellite {id}"),
        format!(
            "{} - plane {} / #{}",
            details.constellation_name, details.plane, details.index
        ),
        format!(
            "a: {:.1} km  e: {:.4}",
            orbit.semi_major_axis_km, orbit.eccentricity
        ),
        format!(
            "i: {:.2}°  RAAN: {:.2}°",
            orbit.inclination_deg, orbit.raan_deg
        ),
        format!(
            "ω: {:.2}°  ν: {:.2}°",
            orbit.argument_of_perigee_deg, orbit.true_anomaly_deg
        ),
    ];
    if let Some([vx, vy, vz]) = details.velocity.as_ref().and_then(|v| v.evaluate(t)) {
        let speed_km_s = (vx * vx + vy * vy + vz * vz).sqrt() / 1000.0;
        lines.push(format!("speed: {speed_km_s:.3} km/s"));
    }
    lines
}

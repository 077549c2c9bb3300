use bevy::math::{DVec3, Vec3};
use smartlink_core::Location;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geodetic (WGS84) to Earth-fixed cartesian metres.
pub fn geodetic_to_ecef(lon_deg: f64, lat_deg: f64, height_m: f64) -> DVec3 {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    let n = WGS84_A / (1.0 - e2 * lat.sin().powi(2)).sqrt();
    DVec3::new(
        (n + height_m) * lat.cos() * lon.cos(),
        (n + height_m) * lat.cos() * lon.sin(),
        (n * (1.0 - e2) + height_m) * lat.sin(),
    )
}

pub fn location_to_ecef(loc: &Location) -> DVec3 {
    geodetic_to_ecef(loc.longitude_deg, loc.latitude_deg, loc.height_m)
}

/// Earth-fixed metres to render space: Y up, `metres_per_unit` metres per unit.
pub fn ecef_to_world(p: DVec3, metres_per_unit: f64) -> Vec3 {
    let s = 1.0 / metres_per_unit;
    Vec3::new((p.x * s) as f32, (p.z * s) as f32, (-p.y * s) as f32)
}

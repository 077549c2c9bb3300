//! Backend ephemeris payloads and their decoded, time-sampled form.
//!
//! The backend ships every coordinate axis as a base64 blob of packed floats. The
//! samples are evenly spread over the horizon: sample `i` of `n` sits at
//! `start + i * (end - start) / (n - 1)`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{Horizon, SatelliteId};

const KM_TO_M: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatType {
    Float16,
    #[default]
    Float32,
    Float64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianess {
    #[default]
    Little,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MemoryOrder {
    #[default]
    C,
    F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    Gzip,
    Zlib,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatDataFormat {
    #[serde(rename = "type")]
    pub kind: FloatType,
    pub endianess: Endianess,
    pub order: MemoryOrder,
    pub compress: Option<Compression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedPosition {
    pub x_km: String,
    pub y_km: String,
    pub z_km: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedVelocity {
    pub dx_km_per_s: String,
    pub dy_km_per_s: String,
    pub dz_km_per_s: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedEphemeris {
    pub position: EncodedPosition,
    #[serde(default)]
    pub velocity: Option<EncodedVelocity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EphemerisResponse {
    pub horizon: Horizon,
    #[serde(default)]
    pub velocity: bool,
    #[serde(default)]
    pub format: FloatDataFormat,
    pub ephemeris: HashMap<SatelliteId, EncodedEphemeris>,
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("satellite {satellite_id}: invalid base64 in {axis}")]
    Base64 {
        satellite_id: SatelliteId,
        axis: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    #[error("unsupported float type {0:?}")]
    UnsupportedType(FloatType),
    #[error("compressed payloads ({0:?}) are not supported")]
    Compressed(Compression),
    #[error("satellite {satellite_id}: {len} bytes is not a multiple of {width}")]
    Misaligned {
        satellite_id: SatelliteId,
        len: usize,
        width: usize,
    },
    #[error("satellite {satellite_id}: axis lengths differ ({x}/{y}/{z})")]
    LengthMismatch {
        satellite_id: SatelliteId,
        x: usize,
        y: usize,
        z: usize,
    },
    #[error("horizon ends before it starts ({start} > {end})")]
    InvalidHorizon {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Position samples with linear interpolation in between.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampledPosition {
    times: Vec<DateTime<Utc>>,
    points: Vec<[f64; 3]>,
}

impl SampledPosition {
    pub fn evenly_spaced(start: DateTime<Utc>, end: DateTime<Utc>, points: Vec<[f64; 3]>) -> Self {
        let n = points.len();
        let total_us = (end - start).num_microseconds().unwrap_or(i64::MAX) as i128;
        let times = (0..n)
            .map(|i| {
                if n < 2 {
                    return start;
                }
                let offset = (i as i128 * total_us / (n as i128 - 1)) as i64;
                start + Duration::microseconds(offset)
            })
            .collect();
        Self { times, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.times.first()?, *self.times.last()?))
    }

    /// Nothing outside the sampled interval (no extrapolation).
    pub fn evaluate(&self, t: DateTime<Utc>) -> Option<[f64; 3]> {
        let (first, last) = self.interval()?;
        if t < first || t > last {
            return None;
        }
        let idx = self.times.partition_point(|s| *s <= t);
        let i = idx.saturating_sub(1);
        if i + 1 >= self.times.len() {
            return Some(self.points[i]);
        }
        let span = (self.times[i + 1] - self.times[i]).num_microseconds()? as f64;
        let into = (t - self.times[i]).num_microseconds()? as f64;
        let f = if span > 0.0 { into / span } else { 0.0 };
        let (a, b) = (self.points[i], self.points[i + 1]);
        Some([
            a[0] + (b[0] - a[0]) * f,
            a[1] + (b[1] - a[1]) * f,
            a[2] + (b[2] - a[2]) * f,
        ])
    }
}

#[derive(Debug, Clone)]
pub struct SatelliteTrack {
    /// Metres.
    pub position: Arc<SampledPosition>,
    /// Metres per second.
    pub velocity: Option<Arc<SampledPosition>>,
}

#[derive(Debug, Clone)]
pub struct Ephemeris {
    pub horizon: Horizon,
    pub tracks: HashMap<SatelliteId, SatelliteTrack>,
}

impl Ephemeris {
    pub fn track(&self, id: SatelliteId) -> Option<&SatelliteTrack> {
        self.tracks.get(&id)
    }
}

impl EphemerisResponse {
    pub fn decode(&self) -> Result<Ephemeris, DecodeError> {
        let Horizon { start, end, .. } = self.horizon;
        if end < start {
            return Err(DecodeError::InvalidHorizon { start, end });
        }
        let mut tracks = HashMap::with_capacity(self.ephemeris.len());
        for (&satellite_id, encoded) in &self.ephemeris {
            let p = &encoded.position;
            let position = decode_axes(
                satellite_id,
                &self.format,
                [("x_km", &p.x_km), ("y_km", &p.y_km), ("z_km", &p.z_km)],
            )?;
            let velocity = match &encoded.velocity {
                Some(v) => Some(decode_axes(
                    satellite_id,
                    &self.format,
                    [
                        ("dx_km_per_s", &v.dx_km_per_s),
                        ("dy_km_per_s", &v.dy_km_per_s),
                        ("dz_km_per_s", &v.dz_km_per_s),
                    ],
                )?),
                None => None,
            };
            tracks.insert(
                satellite_id,
                SatelliteTrack {
                    position: Arc::new(SampledPosition::evenly_spaced(start, end, position)),
                    velocity: velocity
                        .map(|v| Arc::new(SampledPosition::evenly_spaced(start, end, v))),
                },
            );
        }
        Ok(Ephemeris {
            horizon: self.horizon,
            tracks,
        })
    }
}

fn decode_axes(
    satellite_id: SatelliteId,
    format: &FloatDataFormat,
    axes: [(&'static str, &String); 3],
) -> Result<Vec<[f64; 3]>, DecodeError> {
    let [x, y, z] = axes.map(|(axis, blob)| decode_floats(satellite_id, axis, blob, format));
    let (x, y, z) = (x?, y?, z?);
    if x.len() != y.len() || x.len() != z.len() {
        return Err(DecodeError::LengthMismatch {
            satellite_id,
            x: x.len(),
            y: y.len(),
            z: z.len(),
        });
    }
    Ok(x
        .iter()
        .zip(&y)
        .zip(&z)
        .map(|((x, y), z)| [x * KM_TO_M, y * KM_TO_M, z * KM_TO_M])
        .collect())
}

pub fn decode_floats(
    satellite_id: SatelliteId,
    axis: &'static str,
    blob: &str,
    format: &FloatDataFormat,
) -> Result<Vec<f64>, DecodeError> {
    if let Some(c) = format.compress {
        return Err(DecodeError::Compressed(c));
    }
    let bytes = STANDARD
        .decode(blob.trim())
        .map_err(|source| DecodeError::Base64 {
            satellite_id,
            axis,
            source,
        })?;
    let width = match format.kind {
        FloatType::Float32 => 4,
        FloatType::Float64 => 8,
        other => return Err(DecodeError::UnsupportedType(other)),
    };
    if bytes.len() % width != 0 {
        return Err(DecodeError::Misaligned {
            satellite_id,
            len: bytes.len(),
            width,
        });
    }
    let big = format.endianess == Endianess::Big;
    Ok(bytes
        .chunks_exact(width)
        .map(|c| match (width, big) {
            (4, false) => f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64,
            (4, true) => f32::from_be_bytes([c[0], c[1], c[2], c[3]]) as f64,
            (_, false) => f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]),
            (_, true) => f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]),
        })
        .collect())
}

/// Packs values the way the backend does; used by the feed's fixtures and tests.
pub fn encode_floats(values: &[f64], format: &FloatDataFormat) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        match (format.kind, format.endianess) {
            (FloatType::Float64, Endianess::Little) => bytes.extend(v.to_le_bytes()),
            (FloatType::Float64, Endianess::Big) => bytes.extend(v.to_be_bytes()),
            (_, Endianess::Little) => bytes.extend((*v as f32).to_le_bytes()),
            (_, Endianess::Big) => bytes.extend((*v as f32).to_be_bytes()),
        }
    }
    STANDARD.encode(bytes)
}

impl EphemerisResponse {
    /// Builds a position-only payload from kilometre samples.
    pub fn from_samples(
        horizon: Horizon,
        format: FloatDataFormat,
        samples: impl IntoIterator<Item = (SatelliteId, Vec<[f64; 3]>)>,
    ) -> Self {
        let ephemeris = samples
            .into_iter()
            .map(|(id, points)| {
                let axis = |i: usize| {
                    let values: Vec<f64> = points.iter().map(|p| p[i]).collect();
                    encode_floats(&values, &format)
                };
                let position = EncodedPosition {
                    x_km: axis(0),
                    y_km: axis(1),
                    z_km: axis(2),
                };
                (
                    id,
                    EncodedEphemeris {
                        position,
                        velocity: None,
                    },
                )
            })
            .collect();
        Self {
            horizon,
            velocity: false,
            format,
            ephemeris,
        }
    }
}

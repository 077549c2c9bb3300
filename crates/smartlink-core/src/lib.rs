use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub mod ephemeris;

pub use ephemeris::{
    DecodeError, Ephemeris, EphemerisResponse, FloatDataFormat, SampledPosition, SatelliteTrack,
};

pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Upper bound for one length-delimited frame on the feed socket. A snapshot
/// carries the whole ephemeris, which passes 8 MiB for a day of a few hundred
/// satellites.
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

pub type StationId = u64;
pub type SatelliteId = u64;
pub type ConstellationId = u64;
pub type SystemId = u64;
pub type TopologyId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    #[serde(default)]
    pub height_m: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub location: Location,
}

impl Station {
    /// `"<country> - <city>"`, or nothing when both are empty.
    pub fn label(&self) -> Option<String> {
        if self.city.is_empty() && self.country.is_empty() {
            return None;
        }
        Some(format!("{} - {}", self.country, self.city))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatelliteOrbit {
    pub semi_major_axis_km: f64,
    pub inclination_deg: f64,
    pub eccentricity: f64,
    pub argument_of_perigee_deg: f64,
    pub true_anomaly_deg: f64,
    pub raan_deg: f64,
    pub epoch: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Satellite {
    pub id: SatelliteId,
    pub orbit: SatelliteOrbit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constellation {
    pub id: ConstellationId,
    pub name: String,
    #[serde(default)]
    pub n_planes: usize,
    #[serde(default)]
    pub n_per_plane: usize,
    /// Satellites grouped by orbital plane.
    pub satellites: Vec<Vec<Satellite>>,
}

impl Constellation {
    pub fn satellite_ids(&self) -> impl Iterator<Item = SatelliteId> + '_ {
        self.satellites.iter().flatten().map(|s| s.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub id: SystemId,
    pub name: String,
    pub constellations: Vec<Constellation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Horizon {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub step_s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkType {
    #[serde(rename = "intra-plane")]
    IntraPlane,
    #[serde(rename = "inter-plane")]
    InterPlane,
}

impl LinkType {
    pub const ALL: [LinkType; 2] = [LinkType::IntraPlane, LinkType::InterPlane];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IntraPlane => "intra-plane",
            Self::InterPlane => "inter-plane",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub id: TopologyId,
    pub name: String,
    /// Link lists keyed by link-type name (`intra-plane`, `inter-plane`).
    pub neighbors: BTreeMap<String, Vec<(SatelliteId, SatelliteId)>>,
}

impl Topology {
    pub fn links(&self, kind: LinkType) -> Option<&[(SatelliteId, SatelliteId)]> {
        self.neighbors.get(kind.as_str()).map(Vec::as_slice)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyWithConstellation {
    pub constellation_id: ConstellationId,
    pub topology: Topology,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EligibilityWindow {
    pub satellite_id: SatelliteId,
    pub station_id: StationId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Everything the feed currently knows about a mission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissionSnapshot {
    #[serde(default)]
    pub stations: Option<Vec<Station>>,
    #[serde(default)]
    pub system: Option<System>,
    #[serde(default)]
    pub ephemeris: Option<EphemerisResponse>,
    #[serde(default)]
    pub topologies: Option<Vec<TopologyWithConstellation>>,
    #[serde(default)]
    pub eligibilities: Option<Vec<EligibilityWindow>>,
}

pub fn topologies_by_constellation(
    topologies: Vec<TopologyWithConstellation>,
) -> HashMap<ConstellationId, TopologyWithConstellation> {
    topologies
        .into_iter()
        .map(|t| (t.constellation_id, t))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Delta {
    SetStations { stations: Vec<Station> },
    RemoveStations,
    SetSatellites { system: System, ephemeris: EphemerisResponse },
    RemoveSatellites,
    SetTopologies { topologies: Vec<TopologyWithConstellation> },
    SetEligibilities { windows: Vec<EligibilityWindow> },
    RemoveEligibilities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Msg {
    Hello { version: String },
    RequestSnapshot,
    Snapshot { mission: MissionSnapshot },
    Event { delta: Delta },
    Ping,
    Pong,
}

//! Builders shared by the scene tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use smartlink_core::{
    Constellation, ConstellationId, EligibilityWindow, Ephemeris, Horizon, LinkType, Location,
    SampledPosition, Satellite, SatelliteId, SatelliteOrbit, SatelliteTrack, Station, StationId,
    System, Topology, TopologyId, TopologyWithConstellation,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

pub fn horizon() -> Horizon {
    Horizon {
        start: t0(),
        end: t0() + Duration::hours(1),
        step_s: 60.0,
    }
}

fn orbit() -> SatelliteOrbit {
    SatelliteOrbit {
        semi_major_axis_km: 7000.0,
        inclination_deg: 53.0,
        eccentricity: 0.0,
        argument_of_perigee_deg: 0.0,
        true_anomaly_deg: 0.0,
        raan_deg: 0.0,
        epoch: t0(),
    }
}

/// One constellation per entry, planes given as satellite ids.
pub fn system(constellations: &[(ConstellationId, Vec<Vec<SatelliteId>>)]) -> System {
    System {
        id: 1,
        name: "system".to_string(),
        constellations: constellations
            .iter()
            .map(|(cid, planes)| Constellation {
                id: *cid,
                name: format!("constellation {cid}"),
                n_planes: planes.len(),
                n_per_plane: planes.first().map(Vec::len).unwrap_or(0),
                satellites: planes
                    .iter()
                    .map(|plane| {
                        plane
                            .iter()
                            .map(|id| Satellite {
                                id: *id,
                                orbit: orbit(),
                            })
                            .collect()
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Straight-line tracks over the fixture horizon, one per id.
pub fn ephemeris(ids: &[SatelliteId]) -> Ephemeris {
    let h = horizon();
    let tracks: HashMap<_, _> = ids
        .iter()
        .map(|id| {
            let x = *id as f64 * 1_000_000.0;
            let position =
                SampledPosition::evenly_spaced(h.start, h.end, vec![[x, 0.0, 7e6], [x, 1e6, 7e6]]);
            (
                *id,
                SatelliteTrack {
                    position: Arc::new(position),
                    velocity: None,
                },
            )
        })
        .collect();
    Ephemeris { horizon: h, tracks }
}

pub fn station(id: StationId) -> Station {
    Station {
        id,
        city: format!("city {id}"),
        country: "France".to_string(),
        location: Location {
            longitude_deg: 1.44,
            latitude_deg: 43.6,
            height_m: 150.0,
        },
    }
}

pub fn topology(
    constellation_id: ConstellationId,
    id: TopologyId,
    intra: &[(SatelliteId, SatelliteId)],
    inter: &[(SatelliteId, SatelliteId)],
) -> TopologyWithConstellation {
    let mut neighbors = BTreeMap::new();
    if !intra.is_empty() {
        neighbors.insert(LinkType::IntraPlane.as_str().to_string(), intra.to_vec());
    }
    if !inter.is_empty() {
        neighbors.insert(LinkType::InterPlane.as_str().to_string(), inter.to_vec());
    }
    TopologyWithConstellation {
        constellation_id,
        topology: Topology {
            id,
            name: format!("topology {id}"),
            neighbors,
        },
    }
}

pub fn topologies(
    items: Vec<TopologyWithConstellation>,
) -> HashMap<ConstellationId, TopologyWithConstellation> {
    smartlink_core::topologies_by_constellation(items)
}

pub fn window(
    satellite_id: SatelliteId,
    station_id: StationId,
    start_min: i64,
    end_min: i64,
) -> EligibilityWindow {
    EligibilityWindow {
        satellite_id,
        station_id,
        start: t0() + Duration::minutes(start_min),
        end: t0() + Duration::minutes(end_min),
    }
}

/// A viewer with the shared link collection mounted, as the coordinator does.
pub fn viewer() -> crate::scene::viewer::SceneViewer {
    use crate::scene::collection::EntityCollection;
    use crate::scene::ids::CollectionId;

    let mut v = crate::scene::viewer::SceneViewer::new();
    v.add_collection(EntityCollection::new(CollectionId::Custom, "links"));
    v
}

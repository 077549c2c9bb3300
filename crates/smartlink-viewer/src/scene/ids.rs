//! Structured entity identity.
//!
//! Layers index entities by [`EntityKey`]; the `SAT_`/`STA_`/`TOPO_`/`ELIG_` strings
//! only exist at the `Display` boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use smartlink_core::{ConstellationId, LinkType, SatelliteId, StationId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionId {
    Stations,
    /// Scratch collection shared by topology and eligibility links.
    Custom,
    Constellation(ConstellationId),
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stations => f.write_str("stations"),
            Self::Custom => f.write_str("customPrimCollec"),
            Self::Constellation(cid) => write!(f, "constellation-{cid}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Satellite(SatelliteId),
    Station(StationId),
    TopologyLink {
        constellation: ConstellationId,
        kind: LinkType,
        a: SatelliteId,
        b: SatelliteId,
    },
    Eligibility {
        satellite: SatelliteId,
        station: StationId,
        start: DateTime<Utc>,
    },
}

impl EntityKey {
    pub fn is_topology_of(&self, cid: ConstellationId) -> bool {
        matches!(self, Self::TopologyLink { constellation, .. } if *constellation == cid)
    }

    pub fn is_topology(&self) -> bool {
        matches!(self, Self::TopologyLink { .. })
    }

    pub fn is_eligibility(&self) -> bool {
        matches!(self, Self::Eligibility { .. })
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satellite(id) => write!(f, "SAT_{id}"),
            Self::Station(id) => write!(f, "STA_{id}"),
            Self::TopologyLink {
                constellation,
                kind,
                a,
                b,
            } => write!(
                f,
                "TOPO_ConstId-{constellation}_{}_SAT1-{a}_SAT2-{b}",
                kind.as_str()
            ),
            Self::Eligibility {
                satellite,
                station,
                start,
            } => write!(
                f,
                "ELIG_{satellite}_{station}_{}",
                start.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
        }
    }
}

/// A live reference: resolved against the scene every time it is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub collection: CollectionId,
    pub key: EntityKey,
}

impl EntityRef {
    pub fn new(collection: CollectionId, key: EntityKey) -> Self {
        Self { collection, key }
    }

    pub fn satellite(cid: ConstellationId, id: SatelliteId) -> Self {
        Self::new(CollectionId::Constellation(cid), EntityKey::Satellite(id))
    }

    pub fn station(id: StationId) -> Self {
        Self::new(CollectionId::Stations, EntityKey::Station(id))
    }
}

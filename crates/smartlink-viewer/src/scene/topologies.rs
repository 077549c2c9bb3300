use bevy::color::Color;
use smallvec::smallvec;
use smartlink_core::{ConstellationId, LinkType, SatelliteId, TopologyId, TopologyWithConstellation};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::scene::entity::{PolylineGraphics, SceneEntity, Visibility};
use crate::scene::ids::{CollectionId, EntityKey, EntityRef};
use crate::scene::satellites::SatelliteLookup;
use crate::scene::toolbar::{LinkPresence, Toolbar};
use crate::scene::viewer::SceneViewer;
use crate::scene::SyncReport;

pub const INTRA_PLANE_COLOR: Color = Color::srgb(1.0, 0.647, 0.0);
pub const INTER_PLANE_COLOR: Color = Color::srgb(0.0, 0.502, 0.0);

fn link_color(kind: LinkType) -> Color {
    match kind {
        LinkType::IntraPlane => INTRA_PLANE_COLOR,
        LinkType::InterPlane => INTER_PLANE_COLOR,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstalledTopology {
    pub topology_id: TopologyId,
    pub links: LinkPresence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TopologyAction {
    Keep,
    Create,
    Delete,
    Change,
}

fn diff(old: Option<TopologyId>, new: Option<TopologyId>) -> TopologyAction {
    match (old, new) {
        (None, None) => TopologyAction::Keep,
        (Some(a), Some(b)) if a == b => TopologyAction::Keep,
        (None, Some(_)) => TopologyAction::Create,
        (Some(_), None) => TopologyAction::Delete,
        (Some(_), Some(_)) => TopologyAction::Change,
    }
}

/// Drops repeated undirected pairs, keeping the first orientation seen.
pub fn dedup_links(links: &[(SatelliteId, SatelliteId)]) -> Vec<(SatelliteId, SatelliteId)> {
    let mut seen = HashSet::with_capacity(links.len());
    links
        .iter()
        .copied()
        .filter(|&(a, b)| seen.insert((a.min(b), a.max(b))))
        .collect()
}

/// Inter/intra-plane links, diffed per constellation by topology id.
#[derive(Debug, Default)]
pub struct TopologyLayer {
    installed: BTreeMap<ConstellationId, InstalledTopology>,
    /// Last requested topologies, rebuilt against each new set of satellites.
    requested: Option<HashMap<ConstellationId, TopologyWithConstellation>>,
}

impl TopologyLayer {
    pub fn installed(&self, cid: ConstellationId) -> Option<&InstalledTopology> {
        self.installed.get(&cid)
    }

    pub fn presence(&self) -> BTreeMap<ConstellationId, LinkPresence> {
        self.installed
            .iter()
            .map(|(cid, t)| (*cid, t.links))
            .collect()
    }

    pub fn set(
        &mut self,
        viewer: &mut SceneViewer,
        lookup: &dyn SatelliteLookup,
        toolbar: &mut Toolbar,
        topologies: Option<&HashMap<ConstellationId, TopologyWithConstellation>>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        if let Some(requested) = topologies {
            let constellations = lookup.constellation_ids();
            for cid in requested.keys().filter(|cid| !constellations.contains(cid)) {
                tracing::debug!(constellation_id = cid, "topology for a constellation not rendered");
                report.skipped += 1;
            }
        }

        for cid in lookup.constellation_ids() {
            let requested = topologies.and_then(|t| t.get(&cid));
            let old = self.installed.get(&cid).map(|t| t.topology_id);
            let new = requested.map(|t| t.topology.id);

            match (diff(old, new), requested) {
                (TopologyAction::Keep, _) => {}
                (TopologyAction::Create, Some(topology)) => {
                    self.create(viewer, lookup, toolbar.link_width(), cid, topology, &mut report);
                }
                (TopologyAction::Delete, _) => {
                    report.removed += self.remove_constellation(viewer, cid);
                }
                (TopologyAction::Change, Some(topology)) => {
                    report.removed += self.remove_constellation(viewer, cid);
                    self.create(viewer, lookup, toolbar.link_width(), cid, topology, &mut report);
                }
                (TopologyAction::Create | TopologyAction::Change, None) => {}
            }
        }

        self.requested = topologies.cloned();
        toolbar.refresh_topology_options(viewer, &self.presence());
        tracing::info!(
            created = report.created,
            removed = report.removed,
            skipped = report.skipped,
            "topologies synchronized"
        );
        report
    }

    fn create(
        &mut self,
        viewer: &mut SceneViewer,
        lookup: &dyn SatelliteLookup,
        width: f32,
        cid: ConstellationId,
        topology: &TopologyWithConstellation,
        report: &mut SyncReport,
    ) {
        let Some(custom) = viewer.collection_mut(CollectionId::Custom) else {
            return;
        };
        let topology = &topology.topology;
        self.installed.insert(
            cid,
            InstalledTopology {
                topology_id: topology.id,
                links: LinkPresence {
                    intra: topology.links(LinkType::IntraPlane).is_some(),
                    inter: topology.links(LinkType::InterPlane).is_some(),
                },
            },
        );

        for kind in LinkType::ALL {
            let Some(links) = topology.links(kind) else {
                continue;
            };
            for (a, b) in dedup_links(links) {
                let rendered = |sat| lookup.constellation_of(sat) == Some(cid);
                if !rendered(a) || !rendered(b) {
                    tracing::debug!(
                        constellation_id = cid,
                        a,
                        b,
                        "link endpoint not rendered, skipping"
                    );
                    report.skipped += 1;
                    continue;
                }
                let key = EntityKey::TopologyLink {
                    constellation: cid,
                    kind,
                    a,
                    b,
                };
                let line = PolylineGraphics {
                    positions: smallvec![EntityRef::satellite(cid, a), EntityRef::satellite(cid, b)],
                    width,
                    color: link_color(kind),
                    show: Visibility::Always,
                };
                match custom.add(SceneEntity::polyline(key, line)) {
                    Ok(()) => report.created += 1,
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping topology link");
                        report.skipped += 1;
                    }
                }
            }
        }
    }

    pub fn remove_constellation(&mut self, viewer: &mut SceneViewer, cid: ConstellationId) -> usize {
        self.installed.remove(&cid);
        viewer
            .collection_mut(CollectionId::Custom)
            .map(|c| c.remove_where(|k| k.is_topology_of(cid)))
            .unwrap_or(0)
    }

    /// Rebuilds every link from the last request after the satellites changed.
    ///
    /// Link endpoints are checked only at creation, so links are dropped and
    /// recreated even when a constellation keeps its topology id.
    pub fn reinstall(
        &mut self,
        viewer: &mut SceneViewer,
        lookup: &dyn SatelliteLookup,
        toolbar: &mut Toolbar,
    ) -> SyncReport {
        let removed = self.clear(viewer);
        let requested = self.requested.take();
        let mut report = self.set(viewer, lookup, toolbar, requested.as_ref());
        report.removed += removed;
        report
    }

    pub fn remove_all(&mut self, viewer: &mut SceneViewer, toolbar: &mut Toolbar) -> usize {
        self.requested = None;
        let removed = self.clear(viewer);
        toolbar.refresh_topology_options(viewer, &BTreeMap::new());
        removed
    }

    fn clear(&mut self, viewer: &mut SceneViewer) -> usize {
        self.installed.clear();
        viewer
            .collection_mut(CollectionId::Custom)
            .map(|c| c.remove_where(EntityKey::is_topology))
            .unwrap_or(0)
    }
}

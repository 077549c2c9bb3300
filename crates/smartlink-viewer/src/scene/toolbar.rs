//! Overlay controls: clock reset and the constellation, topology and eligibility
//! selectors.
//!
//! The toolbar owns no entities. Its change handlers only flip `show`/`width` on
//! entities that already exist, addressing them through their [`EntityKey`].

use smartlink_core::{ConstellationId, LinkType};
use std::collections::BTreeMap;

use crate::scene::ids::{CollectionId, EntityKey};
use crate::scene::satellites::SatelliteLookup;
use crate::scene::viewer::SceneViewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstellationChoice {
    #[default]
    All,
    Constellation(ConstellationId),
}

impl ConstellationChoice {
    pub fn includes(self, cid: ConstellationId) -> bool {
        match self {
            Self::All => true,
            Self::Constellation(selected) => selected == cid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyFilter {
    #[default]
    All,
    Inter,
    Intra,
    None,
}

impl TopologyFilter {
    pub fn admits(self, kind: LinkType) -> bool {
        match self {
            Self::All => true,
            Self::Inter => kind == LinkType::InterPlane,
            Self::Intra => kind == LinkType::IntraPlane,
            Self::None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EligibilityFilter {
    #[default]
    Show,
    Hide,
}

/// Which link types an installed topology carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LinkPresence {
    pub intra: bool,
    pub inter: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption<T> {
    pub value: T,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Select<T> {
    pub options: Vec<SelectOption<T>>,
    pub selected: T,
    pub visible: bool,
}

impl<T: Copy + PartialEq + Default> Select<T> {
    fn hidden() -> Self {
        Self {
            options: Vec::new(),
            selected: T::default(),
            visible: false,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.options.iter().any(|o| o.value == value)
    }

    /// Replaces the option list and selects the first entry.
    fn set_options(&mut self, options: Vec<SelectOption<T>>) {
        self.selected = options.first().map(|o| o.value).unwrap_or_default();
        self.options = options;
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.value == self.selected)
            .map(|o| o.label.as_str())
    }
}

fn option<T>(value: T, label: impl Into<String>) -> SelectOption<T> {
    SelectOption {
        value,
        label: label.into(),
    }
}

#[derive(Debug, Clone)]
pub struct Toolbar {
    pub constellation: Select<ConstellationChoice>,
    pub topology: Select<TopologyFilter>,
    pub eligibility: Select<EligibilityFilter>,
    link_width: f32,
}

impl Toolbar {
    pub fn new(link_width: f32) -> Self {
        let mut eligibility = Select::hidden();
        eligibility.set_options(vec![
            option(EligibilityFilter::Show, "Show Elig."),
            option(EligibilityFilter::Hide, "Hide Elig."),
        ]);
        Self {
            constellation: Select::hidden(),
            topology: Select::hidden(),
            eligibility,
            link_width,
        }
    }

    pub fn link_width(&self) -> f32 {
        self.link_width
    }

    pub fn reset_clock(&self, viewer: &mut SceneViewer) {
        viewer.clock.reset();
    }

    /// `All` plus one entry per constellation; shown only when there is a choice to make.
    pub fn set_constellation_options(&mut self, constellations: &[(ConstellationId, String)]) {
        let mut options = vec![option(ConstellationChoice::All, "All")];
        options.extend(
            constellations
                .iter()
                .map(|(cid, name)| option(ConstellationChoice::Constellation(*cid), name.clone())),
        );
        self.constellation.set_options(options);
        self.constellation.visible = constellations.len() > 1;
    }

    pub fn hide_satellite_selectors(&mut self) {
        self.constellation.visible = false;
        self.topology.visible = false;
    }

    /// Link width for an eligibility link under the current constellation choice.
    pub fn eligibility_width(&self, lookup: &dyn SatelliteLookup, satellite: u64) -> f32 {
        let in_scope = match self.constellation.selected {
            ConstellationChoice::All => true,
            ConstellationChoice::Constellation(cid) => lookup.constellation_of(satellite) == Some(cid),
        };
        if in_scope {
            self.link_width
        } else {
            0.0
        }
    }

    pub fn on_constellation_changed(
        &mut self,
        viewer: &mut SceneViewer,
        lookup: &dyn SatelliteLookup,
        presence: &BTreeMap<ConstellationId, LinkPresence>,
        choice: ConstellationChoice,
    ) {
        if !self.constellation.contains(choice) {
            tracing::debug!(?choice, "ignoring unknown constellation choice");
            return;
        }
        self.constellation.selected = choice;

        for cid in lookup.constellation_ids() {
            if let Some(collection) = viewer.collection_mut(CollectionId::Constellation(cid)) {
                collection.show = choice.includes(cid);
            }
        }

        if let Some(custom) = viewer.collection_mut(CollectionId::Custom) {
            for entity in custom.values_mut() {
                let EntityKey::Eligibility { satellite, .. } = entity.key else {
                    continue;
                };
                let width = self.eligibility_width(lookup, satellite);
                if let Some(line) = entity.polyline.as_mut() {
                    line.width = width;
                }
            }
        }

        self.refresh_topology_options(viewer, presence);
    }

    /// Rebuilds the topology filter from the link types present in the selected
    /// constellations, selects the first option and reapplies it.
    pub fn refresh_topology_options(
        &mut self,
        viewer: &mut SceneViewer,
        presence: &BTreeMap<ConstellationId, LinkPresence>,
    ) {
        let choice = self.constellation.selected;
        let (intra, inter) = presence
            .iter()
            .filter(|(cid, _)| choice.includes(**cid))
            .fold((false, false), |(intra, inter), (_, p)| {
                (intra || p.intra, inter || p.inter)
            });

        let mut options = Vec::with_capacity(4);
        if intra && inter {
            options.push(option(TopologyFilter::All, "All"));
        }
        if inter {
            options.push(option(TopologyFilter::Inter, "inter"));
        }
        if intra {
            options.push(option(TopologyFilter::Intra, "intra"));
        }
        self.topology.visible = !options.is_empty();
        options.push(option(TopologyFilter::None, "none"));

        self.topology.set_options(options);
        self.apply_topology_filter(viewer);
    }

    pub fn on_topology_filter_changed(&mut self, viewer: &mut SceneViewer, filter: TopologyFilter) {
        if !self.topology.contains(filter) {
            return;
        }
        self.topology.selected = filter;
        self.apply_topology_filter(viewer);
    }

    pub fn apply_topology_filter(&self, viewer: &mut SceneViewer) {
        let choice = self.constellation.selected;
        let filter = self.topology.selected;
        let Some(custom) = viewer.collection_mut(CollectionId::Custom) else {
            return;
        };
        for entity in custom.values_mut() {
            if let EntityKey::TopologyLink {
                constellation, kind, ..
            } = entity.key
            {
                entity.show = choice.includes(constellation) && filter.admits(kind);
            }
        }
    }

    pub fn show_eligibility_select(&mut self) {
        self.eligibility.visible = true;
        self.eligibility.selected = EligibilityFilter::Show;
    }

    pub fn hide_eligibility_select(&mut self) {
        self.eligibility.visible = false;
    }

    pub fn on_eligibility_filter_changed(
        &mut self,
        viewer: &mut SceneViewer,
        filter: EligibilityFilter,
    ) {
        self.eligibility.selected = filter;
        let Some(custom) = viewer.collection_mut(CollectionId::Custom) else {
            return;
        };
        for entity in custom.values_mut().filter(|e| e.key.is_eligibility()) {
            entity.show = filter == EligibilityFilter::Show;
        }
    }
}

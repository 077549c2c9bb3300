use bevy::prelude::ResMut;
use bevy_egui::{egui, EguiContexts};
use chrono::SecondsFormat;

use crate::scene::toolbar::Select;
use crate::scene::{ConstellationChoice, EligibilityFilter, SceneCoordinator, TopologyFilter};

const MULTIPLIERS: [f64; 7] = [1.0, 10.0, 60.0, 120.0, 300.0, 600.0, 3600.0];

/// A user gesture on the toolbar, applied after the frame's widgets are drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolbarAction {
    ResetClock,
    Constellation(ConstellationChoice),
    Topology(TopologyFilter),
    Eligibility(EligibilityFilter),
    Animate(bool),
    Multiplier(f64),
    Scrub(f64),
}

impl ToolbarAction {
    pub fn apply(self, scene: &mut SceneCoordinator) {
        match self {
            Self::ResetClock => scene.reset_clock(),
            Self::Constellation(choice) => scene.select_constellation(choice),
            Self::Topology(filter) => scene.select_topology_filter(filter),
            Self::Eligibility(filter) => scene.select_eligibility_filter(filter),
            Self::Animate(animate) => scene.set_animating(animate),
            Self::Multiplier(m) => scene.set_clock_multiplier(m),
            Self::Scrub(offset_s) => scene.scrub(offset_s),
        }
    }
}

fn select_combo<T: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: &str,
    select: &Select<T>,
) -> Option<T> {
    if !select.visible {
        return None;
    }
    let mut current = select.selected;
    let text = select
        .options
        .iter()
        .find(|o| o.value == current)
        .map(|o| o.label.clone())
        .unwrap_or_default();
    egui::ComboBox::from_id_source(id)
        .selected_text(text)
        .show_ui(ui, |ui| {
            for option in &select.options {
                ui.selectable_value(&mut current, option.value, option.label.as_str());
            }
        });
    (current != select.selected).then_some(current)
}

pub fn toolbar_overlay(mut contexts: EguiContexts, mut scene: ResMut<SceneCoordinator>) {
    let Some(toolbar) = scene.toolbar().cloned() else {
        return;
    };
    let mut actions = Vec::new();

    egui::TopBottomPanel::top("toolbar").show(contexts.ctx_mut(), |ui| {
        ui.horizontal(|ui| {
            ui.strong("SmartLink");
            ui.separator();
            if ui
                .button("⟲ Reset clock")
                .on_hover_text("Back to the ephemeris start")
                .clicked()
            {
                actions.push(ToolbarAction::ResetClock);
            }
            if let Some(choice) = select_combo(ui, "constellation", &toolbar.constellation) {
                actions.push(ToolbarAction::Constellation(choice));
            }
            if let Some(filter) = select_combo(ui, "topology", &toolbar.topology) {
                actions.push(ToolbarAction::Topology(filter));
            }
            if let Some(filter) = select_combo(ui, "eligibility", &toolbar.eligibility) {
                actions.push(ToolbarAction::Eligibility(filter));
            }
        });
    });

    for action in actions {
        tracing::debug!(?action, "toolbar");
        action.apply(&mut scene);
    }
}

pub fn timeline_overlay(mut contexts: EguiContexts, mut scene: ResMut<SceneCoordinator>) {
    let Some(viewer) = scene.viewer() else {
        return;
    };
    let clock = viewer.clock.clone();
    let timeline = viewer.timeline;
    let mut actions = Vec::new();

    egui::TopBottomPanel::bottom("timeline").show(contexts.ctx_mut(), |ui| {
        ui.horizontal(|ui| {
            let label = if clock.should_animate { "⏸" } else { "▶" };
            if ui.button(label).clicked() {
                actions.push(ToolbarAction::Animate(!clock.should_animate));
            }

            let mut multiplier = clock.multiplier;
            egui::ComboBox::from_id_source("multiplier")
                .selected_text(format!("{multiplier}x"))
                .show_ui(ui, |ui| {
                    for m in MULTIPLIERS {
                        ui.selectable_value(&mut multiplier, m, format!("{m}x"));
                    }
                });
            if multiplier != clock.multiplier {
                actions.push(ToolbarAction::Multiplier(multiplier));
            }

            ui.label(
                clock
                    .current_time
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            );

            let span = timeline.span_s().max(0.0);
            let mut offset = timeline.offset_s(clock.current_time).clamp(0.0, span);
            let before = offset;
            ui.spacing_mut().slider_width = (ui.available_width() - 16.0).max(100.0);
            ui.add(egui::Slider::new(&mut offset, 0.0..=span).show_value(false));
            if offset != before {
                actions.push(ToolbarAction::Scrub(offset));
            }
        });
    });

    for action in actions {
        action.apply(&mut scene);
    }
}

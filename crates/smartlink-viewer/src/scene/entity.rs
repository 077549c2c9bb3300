use bevy::color::Color;
use bevy::math::DVec3;
use chrono::{DateTime, Utc};
use smallvec::SmallVec;
use smartlink_core::SampledPosition;
use std::sync::Arc;

use crate::scene::ids::{EntityKey, EntityRef};

pub const SELECTED_COLOR: Color = Color::srgb(1.0, 0.0, 0.0);

/// Point color for a (possibly selected) entity.
pub fn color_for(selected: bool, base: Color) -> Color {
    if selected {
        SELECTED_COLOR
    } else {
        base
    }
}

#[derive(Debug, Clone)]
pub enum PositionProperty {
    /// ECEF metres.
    Constant(DVec3),
    Sampled(Arc<SampledPosition>),
}

impl PositionProperty {
    pub fn value_at(&self, t: DateTime<Utc>) -> Option<DVec3> {
        match self {
            Self::Constant(p) => Some(*p),
            Self::Sampled(s) => s.evaluate(t).map(DVec3::from_array),
        }
    }
}

/// Inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Always,
    During(TimeWindow),
}

impl Visibility {
    pub fn at(&self, t: DateTime<Utc>) -> bool {
        match self {
            Self::Always => true,
            Self::During(w) => w.contains(t),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointGraphics {
    pub pixel_size: f32,
    pub base_pixel_size: f32,
    pub color: Color,
    pub base_color: Color,
}

impl PointGraphics {
    pub fn new(pixel_size: f32, color: Color) -> Self {
        Self {
            pixel_size,
            base_pixel_size: pixel_size,
            color,
            base_color: color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelGraphics {
    pub text: String,
    pub show: bool,
}

impl LabelGraphics {
    pub fn hidden(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            show: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PolylineGraphics {
    pub positions: SmallVec<[EntityRef; 2]>,
    pub width: f32,
    pub color: Color,
    pub show: Visibility,
}

#[derive(Debug, Clone)]
pub struct SceneEntity {
    pub key: EntityKey,
    pub show: bool,
    pub position: Option<PositionProperty>,
    pub point: Option<PointGraphics>,
    pub label: Option<LabelGraphics>,
    pub polyline: Option<PolylineGraphics>,
    /// Only entities created with a selection state react to clicks.
    pub selected: Option<bool>,
}

impl SceneEntity {
    pub fn point(key: EntityKey, position: PositionProperty, point: PointGraphics) -> Self {
        Self {
            key,
            show: true,
            position: Some(position),
            point: Some(point),
            label: None,
            polyline: None,
            selected: None,
        }
    }

    pub fn polyline(key: EntityKey, polyline: PolylineGraphics) -> Self {
        Self {
            key,
            show: true,
            position: None,
            point: None,
            label: None,
            polyline: Some(polyline),
            selected: None,
        }
    }

    pub fn with_label(mut self, label: Option<LabelGraphics>) -> Self {
        self.label = label;
        self
    }

    pub fn selectable(mut self) -> Self {
        self.selected = Some(false);
        self
    }

    /// Returns the new state, or `None` when the entity is not selectable.
    pub fn toggle_selected(&mut self) -> Option<bool> {
        let selected = !self.selected?;
        self.selected = Some(selected);
        if let Some(point) = self.point.as_mut() {
            point.color = color_for(selected, point.base_color);
        }
        Some(selected)
    }

    pub fn set_hovered(&mut self, hovered: bool, hover_pixel_size: f32) {
        if let Some(label) = self.label.as_mut() {
            label.show = hovered;
        }
        if let Some(point) = self.point.as_mut() {
            point.pixel_size = if hovered {
                hover_pixel_size
            } else {
                point.base_pixel_size
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn window_contains_both_ends() {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let w = TimeWindow {
            start: t0,
            end: t0 + Duration::minutes(10),
        };
        assert!(w.contains(t0));
        assert!(w.contains(t0 + Duration::minutes(10)));
        assert!(!w.contains(t0 - Duration::milliseconds(1)));
        assert!(!Visibility::During(w).at(t0 + Duration::minutes(11)));
        assert!(Visibility::Always.at(t0 - Duration::days(400)));
    }

    #[test]
    fn toggling_selection_recolors_point() {
        let base = Color::srgb(0.0, 0.0, 1.0);
        let mut e = SceneEntity::point(
            EntityKey::Satellite(1),
            PositionProperty::Constant(DVec3::ZERO),
            PointGraphics::new(10.0, base),
        )
        .selectable();
        assert_eq!(e.toggle_selected(), Some(true));
        assert_eq!(e.point.as_ref().unwrap().color, SELECTED_COLOR);
        assert_eq!(e.toggle_selected(), Some(false));
        assert_eq!(e.point.as_ref().unwrap().color, base);
    }

    #[test]
    fn non_selectable_entities_ignore_toggle() {
        let mut e = SceneEntity::point(
            EntityKey::Station(1),
            PositionProperty::Constant(DVec3::ONE),
            PointGraphics::new(12.0, Color::WHITE),
        );
        assert_eq!(e.toggle_selected(), None);
        assert_eq!(e.selected, None);
    }
}

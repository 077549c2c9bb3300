use crate::scene::ids::EntityRef;
use crate::scene::viewer::SceneViewer;

/// Pointer hover/click state. Purely visual, never written back to the store.
#[derive(Debug, Clone)]
pub struct PickHandler {
    last_picked: Option<EntityRef>,
    hover_pixel_size: f32,
}

impl PickHandler {
    pub fn new(hover_pixel_size: f32) -> Self {
        Self {
            last_picked: None,
            hover_pixel_size,
        }
    }

    pub fn hovered(&self) -> Option<EntityRef> {
        self.last_picked
    }

    pub fn on_move(&mut self, viewer: &mut SceneViewer, picked: Option<EntityRef>) {
        if let Some(r) = picked.as_ref() {
            if let Some(entity) = viewer.entity_mut(r) {
                if entity.label.is_some() {
                    entity.set_hovered(true, self.hover_pixel_size);
                }
            }
        }

        if let Some(last) = self.last_picked.filter(|last| Some(*last) != picked) {
            // The previous entity may have been torn down since.
            if let Some(entity) = viewer.entity_mut(&last) {
                if entity.label.is_some() {
                    entity.set_hovered(false, self.hover_pixel_size);
                }
            }
        }
        self.last_picked = picked;
    }

    pub fn on_click(&mut self, viewer: &mut SceneViewer, picked: Option<EntityRef>) -> Option<bool> {
        let r = picked?;
        viewer.entity_mut(&r)?.toggle_selected()
    }

    pub fn reset(&mut self) {
        self.last_picked = None;
    }

    /// Drops the hovered reference when its entity is about to be replaced, so
    /// the next pointer move over the new entity highlights it again.
    pub fn forget_where(&mut self, pred: impl Fn(&EntityRef) -> bool) {
        if self.last_picked.as_ref().is_some_and(pred) {
            self.last_picked = None;
        }
    }
}

use bevy::prelude::Event;

use crate::scene::EntityRef;

/// Left click landed on a scene point.
#[derive(Event, Debug, Clone, Copy)]
pub struct Picked(pub EntityRef);

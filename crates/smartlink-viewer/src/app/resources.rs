use bevy::prelude::Resource;
use crossbeam_channel::Receiver;

use crate::net::{Incoming, ReaderHandle};
use crate::util::config::ViewerConfig;

#[derive(Resource)]
pub struct NetRx(pub Receiver<Incoming>);

/// Present only when a feed reader was started.
#[derive(Resource)]
pub struct Reader(pub ReaderHandle);

#[derive(Resource, Debug, Clone)]
pub struct ViewerSettings(pub ViewerConfig);

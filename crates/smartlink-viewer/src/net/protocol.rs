use smartlink_core::{Delta, MissionSnapshot, Msg};

/// What the reader thread hands to the Bevy world.
#[derive(Debug, Clone)]
pub struct Incoming {
    pub endpoint: String,
    pub kind: IncomingKind,
}

#[derive(Debug, Clone)]
pub enum IncomingKind {
    Connected,
    Disconnected,
    Hello { version: String },
    Snapshot(Box<MissionSnapshot>),
    Event(Box<Delta>),
    Other(Msg),
    Error(String),
}

impl Incoming {
    pub fn connected(endpoint: String) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::Connected,
        }
    }

    pub fn disconnected(endpoint: String) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::Disconnected,
        }
    }

    pub fn error(endpoint: String, msg: String) -> Self {
        Self {
            endpoint,
            kind: IncomingKind::Error(msg),
        }
    }

    pub fn from_msg(endpoint: String, msg: Msg) -> Self {
        let kind = match msg {
            Msg::Hello { version } => IncomingKind::Hello { version },
            Msg::Snapshot { mission } => IncomingKind::Snapshot(Box::new(mission)),
            Msg::Event { delta } => IncomingKind::Event(Box::new(delta)),
            other => IncomingKind::Other(other),
        };
        Self { endpoint, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_feed_messages() {
        let hello = Incoming::from_msg("s".into(), Msg::Hello { version: "0.1.0".into() });
        assert!(matches!(hello.kind, IncomingKind::Hello { ref version } if version == "0.1.0"));

        let event = Incoming::from_msg(
            "s".into(),
            Msg::Event {
                delta: Delta::RemoveStations,
            },
        );
        assert!(matches!(event.kind, IncomingKind::Event(ref d) if **d == Delta::RemoveStations));

        let pong = Incoming::from_msg("s".into(), Msg::Pong);
        assert!(matches!(pong.kind, IncomingKind::Other(Msg::Pong)));
    }
}

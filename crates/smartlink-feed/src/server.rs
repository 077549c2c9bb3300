use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use smartlink_core::{MissionSnapshot, Msg, MAX_FRAME_LEN, PROTOCOL_VERSION};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio_util::bytes::Bytes;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

pub type SharedMission = Arc<RwLock<MissionSnapshot>>;

pub async fn run(sock_path: &str, mission: SharedMission, bus: broadcast::Sender<Msg>) -> Result<()> {
    let listener = UnixListener::bind(sock_path)
        .with_context(|| format!("failed to bind {sock_path}"))?;
    tracing::info!(sock_path, "smartlink-feed listening");

    loop {
        let (stream, _addr) = listener.accept().await?;
        let mission = Arc::clone(&mission);
        let events = bus.subscribe();
        tokio::spawn(async move {
            tracing::info!("viewer connected");
            match serve(stream, mission, events).await {
                Ok(()) => tracing::info!("viewer disconnected"),
                Err(e) => tracing::warn!(error = %e, "viewer connection failed"),
            }
        });
    }
}

fn codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec()
}

async fn send<S>(framed: &mut Framed<S, LengthDelimitedCodec>, msg: &Msg) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    framed.send(Bytes::from(serde_json::to_vec(msg)?)).await?;
    Ok(())
}

async fn send_snapshot<S>(
    framed: &mut Framed<S, LengthDelimitedCodec>,
    mission: &SharedMission,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mission = mission.read().await.clone();
    send(framed, &Msg::Snapshot { mission }).await
}

/// One viewer session: hello exchange, then snapshots on request and live events.
pub async fn serve<S>(
    stream: S,
    mission: SharedMission,
    mut events: broadcast::Receiver<Msg>,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, codec());

    match framed.next().await {
        Some(frame) => match serde_json::from_slice::<Msg>(&frame?)? {
            Msg::Hello { version } if version == PROTOCOL_VERSION => {
                tracing::debug!(%version, "viewer hello");
            }
            Msg::Hello { version } => {
                tracing::warn!(%version, expected = PROTOCOL_VERSION, "protocol version mismatch");
            }
            other => tracing::warn!(?other, "expected hello"),
        },
        None => return Ok(()),
    }
    send(
        &mut framed,
        &Msg::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },
    )
    .await?;

    loop {
        tokio::select! {
            frame = framed.next() => {
                let Some(frame) = frame else {
                    return Ok(());
                };
                match serde_json::from_slice::<Msg>(&frame?)? {
                    Msg::RequestSnapshot => send_snapshot(&mut framed, &mission).await?,
                    Msg::Ping => send(&mut framed, &Msg::Pong).await?,
                    other => tracing::debug!(?other, "ignoring viewer message"),
                }
            }
            event = events.recv() => match event {
                Ok(msg) => send(&mut framed, &msg).await?,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "viewer lagging, resending snapshot");
                    send_snapshot(&mut framed, &mission).await?;
                }
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use smartlink_core::{Delta, EphemerisResponse, FloatDataFormat, Horizon};
    use smartlink_core::ephemeris::FloatType;
    use std::time::Duration;
    use tokio::net::UnixStream;

    async fn recv(framed: &mut Framed<UnixStream, LengthDelimitedCodec>) -> Msg {
        let frame = tokio::time::timeout(Duration::from_secs(10), framed.next())
            .await
            .expect("frame in time")
            .expect("stream open")
            .expect("frame");
        serde_json::from_slice(&frame).expect("msg")
    }

    #[tokio::test]
    async fn session_serves_snapshot_events_and_pong() {
        let (server_end, client_end) = UnixStream::pair().expect("pair");
        let mission: SharedMission = Arc::new(RwLock::new(MissionSnapshot {
            stations: Some(Vec::new()),
            ..MissionSnapshot::default()
        }));
        let (bus, _keep) = broadcast::channel(16);
        tokio::spawn(serve(server_end, Arc::clone(&mission), bus.subscribe()));

        let mut client = Framed::new(client_end, codec());
        send(
            &mut client,
            &Msg::Hello {
                version: PROTOCOL_VERSION.to_string(),
            },
        )
        .await
        .expect("hello");
        assert_eq!(
            recv(&mut client).await,
            Msg::Hello {
                version: PROTOCOL_VERSION.to_string()
            }
        );

        send(&mut client, &Msg::RequestSnapshot).await.expect("request");
        let Msg::Snapshot { mission: got } = recv(&mut client).await else {
            panic!("expected snapshot");
        };
        assert_eq!(got.stations, Some(Vec::new()));

        bus.send(Msg::Event {
            delta: Delta::RemoveStations,
        })
        .expect("subscribed");
        assert_eq!(
            recv(&mut client).await,
            Msg::Event {
                delta: Delta::RemoveStations
            }
        );

        send(&mut client, &Msg::Ping).await.expect("ping");
        assert_eq!(recv(&mut client).await, Msg::Pong);
    }

    async fn hello(client: &mut Framed<UnixStream, LengthDelimitedCodec>) {
        send(
            client,
            &Msg::Hello {
                version: PROTOCOL_VERSION.to_string(),
            },
        )
        .await
        .expect("hello");
        assert!(matches!(recv(client).await, Msg::Hello { .. }));
    }

    #[tokio::test]
    async fn day_long_float64_snapshot_fits_in_one_frame() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let horizon = Horizon {
            start,
            end: start + chrono::Duration::days(1),
            step_s: 60.0,
        };
        let format = FloatDataFormat {
            kind: FloatType::Float64,
            ..FloatDataFormat::default()
        };
        let samples = (1..=200u64).map(|id| {
            let points = (0..1441)
                .map(|i| [7000.0 + id as f64, i as f64 * 0.5, -(i as f64)])
                .collect();
            (id, points)
        });
        let ephemeris = EphemerisResponse::from_samples(horizon, format, samples);
        let mission = MissionSnapshot {
            ephemeris: Some(ephemeris),
            ..MissionSnapshot::default()
        };
        let size = serde_json::to_vec(&Msg::Snapshot {
            mission: mission.clone(),
        })
        .expect("encode")
        .len();
        assert!(size > 8 * 1024 * 1024, "snapshot is only {size} bytes");

        let (server_end, client_end) = UnixStream::pair().expect("pair");
        let (bus, _keep) = broadcast::channel(16);
        tokio::spawn(serve(
            server_end,
            Arc::new(RwLock::new(mission)),
            bus.subscribe(),
        ));
        let mut client = Framed::new(client_end, codec());
        hello(&mut client).await;

        send(&mut client, &Msg::RequestSnapshot).await.expect("request");
        let Msg::Snapshot { mission: got } = recv(&mut client).await else {
            panic!("expected snapshot");
        };
        let got = got.ephemeris.expect("ephemeris");
        assert_eq!(got.ephemeris.len(), 200);
        let decoded = got.decode().expect("decode");
        assert_eq!(decoded.track(200).expect("track").position.len(), 1441);
    }
}

//! Async driver feeding timestamped edges from a channel into a controller.

use embassy_sync::{blocking_mutex::raw::RawMutex, channel::Channel};
use embassy_time::{with_deadline, Instant};

use crate::decoder::{ButtonController, CommandSink, EdgeKind, InputSource, StatusObserver};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EdgeEvent {
    pub kind: EdgeKind,
    pub source: InputSource,
    pub at: Instant,
}

pub type EdgeChannel<M, const N: usize> = Channel<M, EdgeEvent, N>;

/// Waits for the next edge or the next decoder deadline, whichever comes
/// first, and processes it.
pub async fn step<M, const N: usize, S, O>(
    channel: &EdgeChannel<M, N>,
    controller: &mut ButtonController<S, O>,
) where
    M: RawMutex,
    S: CommandSink,
    O: StatusObserver,
{
    let edge = match controller.next_deadline() {
        Some(deadline) => with_deadline(deadline, channel.receive()).await.ok(),
        None => Some(channel.receive().await),
    };
    match edge {
        Some(edge) => {
            controller.edge(edge.kind, edge.source, edge.at);
        }
        None => {
            controller.advance(Instant::now());
        }
    }
}

pub async fn run<M, const N: usize, S, O>(
    channel: &EdgeChannel<M, N>,
    controller: &mut ButtonController<S, O>,
) -> !
where
    M: RawMutex,
    S: CommandSink,
    O: StatusObserver,
{
    loop {
        step(channel, controller).await;
    }
}

/// Stamps the edge with the current time. Edges are never dropped; the caller
/// waits when the channel is full.
pub async fn push_edge<M: RawMutex, const N: usize>(
    channel: &EdgeChannel<M, N>,
    kind: EdgeKind,
    source: InputSource,
) {
    channel
        .send(EdgeEvent {
            kind,
            source,
            at: Instant::now(),
        })
        .await;
}

/// Non-blocking variant for interrupt context. Returns false when full.
pub fn try_push_edge<M: RawMutex, const N: usize>(
    channel: &EdgeChannel<M, N>,
    kind: EdgeKind,
    source: InputSource,
) -> bool {
    let edge = EdgeEvent {
        kind,
        source,
        at: Instant::now(),
    };
    if channel.try_send(edge).is_err() {
        log::warn!("runtime: edge channel full, dropped {:?}", kind);
        return false;
    }
    true
}

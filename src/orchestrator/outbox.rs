//! Per-receiver delivery lanes for outgoing assignments

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use futures::{
    future::BoxFuture,
    stream::{FuturesUnordered, StreamExt},
};
use tokio::sync::mpsc;

/// A pending send, run to completion by the receiver's lane
pub(crate) type Delivery = BoxFuture<'static, ()>;

/// Outgoing deliveries grouped by receiver
///
/// Each receiver gets one lane drained by a single task. Deliveries on a lane are first
/// polled in the order they were posted, so the receiver sees messages in send order,
/// while later deliveries keep running when an earlier one never finishes.
#[derive(Default)]
pub(crate) struct Outbox {
    lanes: Mutex<HashMap<String, mpsc::UnboundedSender<Delivery>>>,
}

impl Outbox {
    /// Queue `delivery` behind everything already posted to `receiver`
    pub(crate) fn post(&self, receiver: &str, delivery: Delivery) {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);

        let delivery = match lanes.get(receiver) {
            Some(lane) => match lane.send(delivery) {
                Ok(()) => return,
                Err(mpsc::error::SendError(delivery)) => delivery,
            },
            None => delivery,
        };

        let (lane, inbox) = mpsc::unbounded_channel();
        tokio::spawn(drain(receiver.to_string(), inbox));
        if lane.send(delivery).is_err() {
            tracing::warn!(receiver = %receiver, "Delivery lane closed before use");
        }
        lanes.insert(receiver.to_string(), lane);
    }

    /// Number of receivers with an open lane
    pub(crate) fn lane_count(&self) -> usize {
        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

async fn drain(receiver: String, mut inbox: mpsc::UnboundedReceiver<Delivery>) {
    tracing::debug!(receiver = %receiver, "Delivery lane opened");
    let mut running = FuturesUnordered::new();

    loop {
        tokio::select! {
            posted = inbox.recv() => match posted {
                Some(delivery) => running.push(delivery),
                None => break,
            },
            Some(()) = running.next(), if !running.is_empty() => {}
        }
    }

    while running.next().await.is_some() {}
    tracing::debug!(receiver = %receiver, "Delivery lane closed");
}

//! Channel registry shared by every connection.
//!
//! Each connection registers a delivery callback once; publishing encodes the
//! message and hands it to the callbacks of the channel's subscribers.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::{resp::RespValue, server::ClientId};

/// Delivers an encoded frame to a subscriber. Returns `false` once the
/// subscriber can no longer receive.
pub type DeliveryCallback = Arc<dyn Fn(Bytes) -> bool + Send + Sync>;

#[derive(Default)]
struct Registry {
    channels: HashMap<Bytes, HashSet<ClientId>>,
    subscriptions: HashMap<ClientId, Vec<Bytes>>,
    callbacks: HashMap<ClientId, DeliveryCallback>,
}

#[derive(Default)]
pub struct PubSubRegistry {
    inner: Mutex<Registry>,
}

impl PubSubRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_client(&self, client_id: ClientId, callback: DeliveryCallback) {
        let mut registry = self.inner.lock().await;
        registry.callbacks.insert(client_id, callback);
    }

    /// Forgets the client and all of its subscriptions.
    pub async fn unregister_client(&self, client_id: ClientId) {
        let mut registry = self.inner.lock().await;
        registry.callbacks.remove(&client_id);

        if let Some(channels) = registry.subscriptions.remove(&client_id) {
            for channel in channels {
                remove_subscriber(&mut registry.channels, &channel, client_id);
            }
        }
    }

    /// Returns the client's subscription count after subscribing.
    pub async fn subscribe(&self, client_id: ClientId, channel: Bytes) -> usize {
        let mut registry = self.inner.lock().await;

        if registry
            .channels
            .entry(channel.clone())
            .or_default()
            .insert(client_id)
        {
            registry
                .subscriptions
                .entry(client_id)
                .or_default()
                .push(channel);
        }

        registry.subscriptions.get(&client_id).map_or(0, Vec::len)
    }

    /// Returns the client's subscription count after unsubscribing.
    pub async fn unsubscribe(&self, client_id: ClientId, channel: &Bytes) -> usize {
        let mut registry = self.inner.lock().await;
        remove_subscriber(&mut registry.channels, channel, client_id);

        let remaining = match registry.subscriptions.get_mut(&client_id) {
            Some(channels) => {
                channels.retain(|subscribed| subscribed != channel);
                channels.len()
            }
            None => 0,
        };

        if remaining == 0 {
            registry.subscriptions.remove(&client_id);
        }

        remaining
    }

    /// Channels the client is subscribed to, in subscription order.
    pub async fn channels_of(&self, client_id: ClientId) -> Vec<Bytes> {
        let registry = self.inner.lock().await;
        registry
            .subscriptions
            .get(&client_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn subscriptions_of(&self, client_id: ClientId) -> usize {
        let registry = self.inner.lock().await;
        registry.subscriptions.get(&client_id).map_or(0, Vec::len)
    }

    /// Sends `["message", channel, message]` to every subscriber and returns
    /// how many of them accepted it.
    pub async fn publish(&self, channel: &Bytes, message: Bytes) -> usize {
        let registry = self.inner.lock().await;

        let Some(subscribers) = registry.channels.get(channel) else {
            return 0;
        };

        let frame = RespValue::Array(vec![
            RespValue::bulk_string("message"),
            RespValue::BulkString(channel.clone()),
            RespValue::BulkString(message),
        ])
        .encode();

        subscribers
            .iter()
            .filter_map(|client_id| registry.callbacks.get(client_id))
            .filter(|callback| callback(frame.clone()))
            .count()
    }
}

fn remove_subscriber(
    channels: &mut HashMap<Bytes, HashSet<ClientId>>,
    channel: &Bytes,
    client_id: ClientId,
) {
    if let Some(subscribers) = channels.get_mut(channel) {
        subscribers.remove(&client_id);

        if subscribers.is_empty() {
            channels.remove(channel);
        }
    }
}

//! Leader and follower replication state.
//!
//! On a leader the coordinator owns the follower set, the queue of writes
//! waiting to be propagated and the rounds of acknowledgements requested by
//! WAIT. On a follower it only counts the bytes applied from the leader link.

use std::collections::{HashMap, HashSet, VecDeque};

use bytes::{BufMut, Bytes, BytesMut};
use rand::{Rng, distributions::Alphanumeric};
use tokio::{
    sync::{
        Mutex,
        mpsc::{UnboundedSender, error::SendError},
    },
    time::{Duration, Instant, sleep},
};
use tracing::{debug, info, warn};

use crate::{resp::RespValue, server::ClientId};

pub const REPLICATION_ID_LENGTH: usize = 40;

/// How often WAIT re-checks acknowledgements and the broadcaster drains the
/// propagation queue.
pub const REPLICATION_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq)]
pub enum RedisRole {
    Master,
    Replica { host: String, port: u16 },
}

impl RedisRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedisRole::Master => "master",
            RedisRole::Replica { .. } => "slave",
        }
    }

    pub fn is_master(&self) -> bool {
        matches!(self, RedisRole::Master)
    }
}

struct Follower {
    sender: UnboundedSender<Bytes>,
    /// Leader offset at the moment the follower attached. Followers count
    /// their own offset from zero after a full resync.
    base_offset: u64,
    acked_offset: u64,
}

struct WaitRound {
    target_offset: u64,
    acknowledged: HashSet<ClientId>,
}

#[derive(Default)]
struct ReplicationState {
    master_offset: u64,
    follower_offset: u64,
    followers: HashMap<ClientId, Follower>,
    pending: VecDeque<(ClientId, Bytes)>,
    wait_rounds: HashMap<ClientId, WaitRound>,
}

pub struct ReplicationCoordinator {
    role: RedisRole,
    repl_id: String,
    inner: Mutex<ReplicationState>,
}

pub fn generate_replication_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REPLICATION_ID_LENGTH)
        .map(char::from)
        .collect()
}

impl ReplicationCoordinator {
    pub fn new(role: RedisRole) -> Self {
        Self {
            role,
            repl_id: generate_replication_id(),
            inner: Mutex::new(ReplicationState::default()),
        }
    }

    pub fn role(&self) -> &RedisRole {
        &self.role
    }

    pub fn repl_id(&self) -> &str {
        &self.repl_id
    }

    /// Queues an executed write for the next broadcast. Nothing is recorded on
    /// a follower or while no follower is connected.
    pub async fn queue_command(&self, client_id: ClientId, command: &RespValue) {
        if !self.role.is_master() {
            return;
        }

        let mut state = self.inner.lock().await;

        if state.followers.is_empty() {
            return;
        }

        state.pending.push_back((client_id, command.encode()));
    }

    /// Forwards every queued write to every follower, in execution order.
    /// Followers whose link is gone are dropped.
    pub async fn broadcast(&self) {
        let mut state = self.inner.lock().await;
        broadcast_pending(&mut state);
    }

    /// Sends `+FULLRESYNC <repl_id> <offset>` and the snapshot frame to a new
    /// follower, then starts propagating writes to it. Writes queued before
    /// the call are flushed to the existing followers first, so the new one
    /// only receives writes the snapshot does not contain.
    pub async fn attach_follower(
        &self,
        client_id: ClientId,
        sender: UnboundedSender<Bytes>,
        snapshot: Bytes,
    ) -> Result<(), SendError<Bytes>> {
        let mut state = self.inner.lock().await;
        broadcast_pending(&mut state);

        let base_offset = state.master_offset;
        let reply = RespValue::SimpleString(format!(
            "FULLRESYNC {} {}",
            self.repl_id, base_offset
        ));
        sender.send(reply.encode())?;

        let mut frame = BytesMut::with_capacity(snapshot.len() + 16);
        frame.put_slice(format!("${}\r\n", snapshot.len()).as_bytes());
        frame.put_slice(&snapshot);
        sender.send(frame.freeze())?;

        state.followers.insert(
            client_id,
            Follower {
                sender,
                base_offset,
                acked_offset: base_offset,
            },
        );

        info!(client_id, followers = state.followers.len(), "follower attached");

        Ok(())
    }

    pub async fn remove_follower(&self, client_id: ClientId) {
        let mut state = self.inner.lock().await;

        if state.followers.remove(&client_id).is_some() {
            info!(client_id, "follower detached");
        }
    }

    pub async fn follower_count(&self) -> usize {
        self.inner.lock().await.followers.len()
    }

    /// Records `REPLCONF ACK <offset>` received from a follower link.
    pub async fn record_ack(&self, follower_id: ClientId, offset: u64) {
        let mut state = self.inner.lock().await;

        let Some(follower) = state.followers.get_mut(&follower_id) else {
            return;
        };

        let acked_offset = follower.base_offset + offset;
        follower.acked_offset = follower.acked_offset.max(acked_offset);

        for round in state.wait_rounds.values_mut() {
            if acked_offset >= round.target_offset {
                round.acknowledged.insert(follower_id);
            }
        }

        debug!(follower_id, offset, "follower acknowledged offset");
    }

    /// Blocks until `required` followers acknowledged every write propagated
    /// before the call, or until `timeout` elapses. `None` waits forever.
    /// Returns the number of followers that acknowledged.
    pub async fn wait_for_acks(
        &self,
        client_id: ClientId,
        required: usize,
        timeout: Option<Duration>,
    ) -> usize {
        let deadline = timeout.and_then(|timeout| Instant::now().checked_add(timeout));

        {
            let mut state = self.inner.lock().await;
            broadcast_pending(&mut state);

            if state.followers.is_empty() {
                return 0;
            }

            let target_offset = state.master_offset;
            let acknowledged: HashSet<ClientId> = state
                .followers
                .iter()
                .filter(|(_, follower)| follower.acked_offset >= target_offset)
                .map(|(id, _)| *id)
                .collect();

            if acknowledged.len() >= required {
                return acknowledged.len();
            }

            state.wait_rounds.insert(
                client_id,
                WaitRound {
                    target_offset,
                    acknowledged,
                },
            );

            let getack = RespValue::command(&["REPLCONF", "GETACK", "*"]).encode();
            let getack_length = getack.len() as u64;
            state
                .followers
                .retain(|_, follower| follower.sender.send(getack.clone()).is_ok());
            state.master_offset += getack_length;
        }

        loop {
            {
                let state = self.inner.lock().await;
                let acknowledged = state
                    .wait_rounds
                    .get(&client_id)
                    .map_or(0, |round| round.acknowledged.len());

                if acknowledged >= required
                    || deadline.is_some_and(|deadline| Instant::now() >= deadline)
                {
                    drop(state);
                    return self.finish_wait_round(client_id).await;
                }
            }

            sleep(REPLICATION_POLL_INTERVAL).await;
        }
    }

    async fn finish_wait_round(&self, client_id: ClientId) -> usize {
        let mut state = self.inner.lock().await;
        state
            .wait_rounds
            .remove(&client_id)
            .map_or(0, |round| round.acknowledged.len())
    }

    /// Adds bytes applied from the leader link to the follower offset.
    pub async fn add_processed_bytes(&self, bytes: usize) {
        let mut state = self.inner.lock().await;
        state.follower_offset += bytes as u64;
    }

    pub async fn master_offset(&self) -> u64 {
        self.inner.lock().await.master_offset
    }

    pub async fn follower_offset(&self) -> u64 {
        self.inner.lock().await.follower_offset
    }

    /// Lines of the replication section reported by INFO.
    pub async fn info(&self) -> Vec<String> {
        let state = self.inner.lock().await;
        let mut lines = vec![format!("role:{}", self.role.as_str())];

        match &self.role {
            RedisRole::Master => {
                lines.push(format!("connected_slaves:{}", state.followers.len()));
                lines.push(format!("master_replid:{}", self.repl_id));
                lines.push(format!("master_repl_offset:{}", state.master_offset));
            }
            RedisRole::Replica { host, port } => {
                lines.push(format!("master_host:{}", host));
                lines.push(format!("master_port:{}", port));
                lines.push(format!("master_replid:{}", self.repl_id));
                lines.push(format!("master_repl_offset:{}", state.follower_offset));
                lines.push(format!("slave_repl_offset:{}", state.follower_offset));
            }
        }

        lines
    }
}

fn broadcast_pending(state: &mut ReplicationState) {
    if state.pending.is_empty() {
        return;
    }

    let before = state.followers.len();

    while let Some((client_id, command)) = state.pending.pop_front() {
        state.master_offset += command.len() as u64;
        state
            .followers
            .retain(|_, follower| follower.sender.send(command.clone()).is_ok());

        debug!(client_id, bytes = command.len(), "propagated write");
    }

    if state.followers.len() < before {
        warn!(
            dropped = before - state.followers.len(),
            "dropped followers with closed links"
        );
    }
}

/// Periodically drains the propagation queue until the process exits.
pub async fn run_broadcaster(coordinator: std::sync::Arc<ReplicationCoordinator>) {
    let mut interval = tokio::time::interval(REPLICATION_POLL_INTERVAL);

    loop {
        interval.tick().await;
        coordinator.broadcast().await;
    }
}

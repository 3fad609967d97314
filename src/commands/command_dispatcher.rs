use std::mem;

use bytes::Bytes;
use tokio::{sync::mpsc::UnboundedSender, time::Instant};
use tracing::debug;

use crate::{
    commands::{
        BlockedState, CommandError, CommandHandler, CommandResult, ExecutionContext,
    },
    resp::RespValue,
    server::{ClientId, ServerContext},
};

/// Commands a follower accepts from its own clients. Writes arrive through
/// the leader link instead; `SET` stays available for local use.
const FOLLOWER_CLIENT_COMMANDS: [&str; 20] = [
    "GET", "SET", "INFO", "PING", "ECHO", "REPLCONF", "TYPE", "KEYS", "CONFIG GET", "LRANGE",
    "LLEN", "XRANGE", "ZRANK", "ZRANGE", "ZCARD", "ZSCORE", "MULTI", "EXEC", "DISCARD", "WAIT",
];

/// Commands accepted while the connection is subscribed to channels.
const SUBSCRIBED_MODE_COMMANDS: [&str; 3] = ["SUBSCRIBE", "UNSUBSCRIBE", "PING"];

/// What sits on the other end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A regular client
    Client,
    /// A follower that completed PSYNC against this leader
    FollowerLink,
    /// This follower's connection to its leader
    LeaderLink,
}

#[derive(Debug)]
enum ConnectionState {
    Normal,
    InTransaction(Vec<CommandHandler>),
    Blocked {
        command: CommandHandler,
        blocked: BlockedState,
    },
    SubscribedOnly,
}

/// Represents the result of dispatching a command.
#[derive(Debug, PartialEq)]
pub enum DispatchResult {
    /// Replies to write back, in order. Empty when nothing is sent.
    Reply(Vec<RespValue>),
    /// The command is waiting for data; see [`CommandDispatcher::poll_blocked`].
    Blocked,
    /// Write the reply, then close the connection.
    Close(RespValue),
}

/// Per-connection command state machine.
///
/// Commands run against the shared keyspace while holding its lock, so a
/// command, and a whole EXEC, is atomic with respect to other connections.
/// Writes executed on a leader are queued for propagation under the same
/// lock, which keeps follower order equal to execution order.
pub struct CommandDispatcher {
    client_id: ClientId,
    link: LinkKind,
    context: ServerContext,
    outbound: UnboundedSender<Bytes>,
    state: ConnectionState,
}

impl CommandDispatcher {
    /// `outbound` is the connection's write channel. PSYNC queues the resync
    /// frames on it directly.
    pub fn new(
        client_id: ClientId,
        link: LinkKind,
        context: ServerContext,
        outbound: UnboundedSender<Bytes>,
    ) -> Self {
        CommandDispatcher {
            client_id,
            link,
            context,
            outbound,
            state: ConnectionState::Normal,
        }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn link(&self) -> LinkKind {
        self.link
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self.state, ConnectionState::Blocked { .. })
    }

    pub fn is_in_transaction(&self) -> bool {
        matches!(self.state, ConnectionState::InTransaction(_))
    }

    pub fn is_subscribed(&self) -> bool {
        matches!(self.state, ConnectionState::SubscribedOnly)
    }

    /// Dispatches one decoded request.
    ///
    /// # Transactional Behavior
    ///
    /// - `MULTI`: Starts a transaction and replies `OK`
    /// - `EXEC`: Runs the queued commands in order and replies with an array
    ///   holding each command's reply or error
    /// - `DISCARD`: Drops the queued commands and replies `OK`
    /// - Other commands: Validated and queued with a `QUEUED` reply while a
    ///   transaction is open, executed immediately otherwise
    ///
    /// Replies on a follower link are never sent, and on a leader link only
    /// `REPLCONF GETACK` is answered.
    pub async fn dispatch(&mut self, input: RespValue) -> DispatchResult {
        let command = match CommandHandler::new(input) {
            Ok(command) => command,
            Err(e) => return self.filter_replies(false, DispatchResult::Reply(vec![e.as_resp()])),
        };

        debug!(client_id = self.client_id, command = %command.name, "dispatching");

        let is_getack = command.name == "REPLCONF"
            && command
                .arguments
                .first()
                .is_some_and(|option| option.eq_ignore_ascii_case(b"getack"));

        if command.name == "QUIT" {
            return DispatchResult::Close(RespValue::ok());
        }

        let result = match mem::replace(&mut self.state, ConnectionState::Normal) {
            ConnectionState::Normal => self.dispatch_normal(command).await,
            ConnectionState::InTransaction(queue) => {
                self.dispatch_in_transaction(queue, command).await
            }
            ConnectionState::SubscribedOnly => {
                self.state = ConnectionState::SubscribedOnly;
                self.dispatch_subscribed(command).await
            }
            blocked @ ConnectionState::Blocked { .. } => {
                self.state = blocked;
                DispatchResult::Reply(vec![
                    CommandError::Internal("connection is blocked".to_string()).as_resp(),
                ])
            }
        };

        self.filter_replies(is_getack, result)
    }

    fn filter_replies(&self, is_getack: bool, result: DispatchResult) -> DispatchResult {
        match (self.link, result) {
            (LinkKind::Client, result) => result,
            (LinkKind::LeaderLink, result) if is_getack => result,
            (_, DispatchResult::Reply(_)) => DispatchResult::Reply(Vec::new()),
            (_, result) => result,
        }
    }

    fn check_role(&self, command: &CommandHandler) -> Result<(), CommandError> {
        let is_follower = !self.context.replication.role().is_master();

        if is_follower
            && self.link == LinkKind::Client
            && !FOLLOWER_CLIENT_COMMANDS.contains(&command.name.as_str())
        {
            return Err(CommandError::ReadOnlyReplica);
        }

        Ok(())
    }

    async fn dispatch_normal(&mut self, command: CommandHandler) -> DispatchResult {
        match command.name.as_str() {
            "MULTI" => {
                self.state = ConnectionState::InTransaction(Vec::new());
                DispatchResult::Reply(vec![RespValue::ok()])
            }
            "EXEC" => DispatchResult::Reply(vec![CommandError::ExecWithoutMulti.as_resp()]),
            "DISCARD" => DispatchResult::Reply(vec![CommandError::DiscardWithoutMulti.as_resp()]),
            _ => {
                if let Err(e) = self.check_role(&command) {
                    return DispatchResult::Reply(vec![e.as_resp()]);
                }

                self.execute_single(command).await
            }
        }
    }

    async fn dispatch_in_transaction(
        &mut self,
        mut queue: Vec<CommandHandler>,
        command: CommandHandler,
    ) -> DispatchResult {
        match command.name.as_str() {
            "EXEC" => self.execute_transaction(queue).await,
            "DISCARD" => DispatchResult::Reply(vec![RespValue::ok()]),
            "MULTI" => {
                self.state = ConnectionState::InTransaction(queue);
                DispatchResult::Reply(vec![CommandError::NestedMulti.as_resp()])
            }
            _ => {
                let validation = self
                    .check_role(&command)
                    .and_then(|_| command.validate_command_arguments());

                let reply = match validation {
                    Ok(()) => {
                        queue.push(command);
                        RespValue::simple_string("QUEUED")
                    }
                    Err(e) => e.as_resp(),
                };

                self.state = ConnectionState::InTransaction(queue);
                DispatchResult::Reply(vec![reply])
            }
        }
    }

    async fn dispatch_subscribed(&mut self, command: CommandHandler) -> DispatchResult {
        if !SUBSCRIBED_MODE_COMMANDS.contains(&command.name.as_str()) {
            return DispatchResult::Reply(vec![
                CommandError::NotAllowedInSubscribedMode(command.name.to_lowercase()).as_resp(),
            ]);
        }

        if command.name == "PING" {
            return match command.handle_subscribed_ping() {
                Ok(CommandResult::Response(response)) => DispatchResult::Reply(vec![response]),
                Ok(_) => DispatchResult::Reply(Vec::new()),
                Err(e) => DispatchResult::Reply(vec![e.as_resp()]),
            };
        }

        self.execute_single(command).await
    }

    /// Queues the follower-facing form of a write for propagation. Only
    /// writes a leader executed for its own clients are propagated.
    async fn propagate(&self, command: &CommandHandler, response: &RespValue) {
        if self.link != LinkKind::Client || !self.context.replication.role().is_master() {
            return;
        }

        if let Some(propagated) = command.propagated_form(response) {
            self.context
                .replication
                .queue_command(self.client_id, &propagated)
                .await;
        }
    }

    async fn refresh_subscription_state(&mut self) {
        let subscriptions = self.context.pub_sub.subscriptions_of(self.client_id).await;

        self.state = match (mem::replace(&mut self.state, ConnectionState::Normal), subscriptions) {
            (ConnectionState::Normal | ConnectionState::SubscribedOnly, 0) => {
                ConnectionState::Normal
            }
            (ConnectionState::Normal | ConnectionState::SubscribedOnly, _) => {
                ConnectionState::SubscribedOnly
            }
            (other, _) => other,
        };
    }

    async fn execute_single(&mut self, command: CommandHandler) -> DispatchResult {
        let context = ExecutionContext {
            client_id: self.client_id,
            server: &self.context,
            outbound: &self.outbound,
            can_block: true,
        };

        let result = if command.runs_without_store() {
            command.handle_storeless_command(&context).await
        } else {
            let mut store = self.context.store.lock().await;
            let result = command.handle_command(&context, &mut store).await;

            if let Ok(CommandResult::Response(response)) = &result {
                self.propagate(&command, response).await;
            }

            result
        };

        let dispatch_result = match result {
            Ok(CommandResult::NoResponse) => DispatchResult::Reply(Vec::new()),
            Ok(CommandResult::Response(response)) => DispatchResult::Reply(vec![response]),
            Ok(CommandResult::Responses(responses)) => DispatchResult::Reply(responses),
            Ok(CommandResult::Block(blocked)) => {
                self.state = ConnectionState::Blocked { command, blocked };
                return DispatchResult::Blocked;
            }
            Ok(CommandResult::Sync) => {
                self.link = LinkKind::FollowerLink;
                DispatchResult::Reply(Vec::new())
            }
            Err(e) => DispatchResult::Reply(vec![e.as_resp()]),
        };

        if matches!(command.name.as_str(), "SUBSCRIBE" | "UNSUBSCRIBE") {
            self.refresh_subscription_state().await;
        }

        dispatch_result
    }

    /// Runs a transaction's queue under one keyspace lock. A failing command
    /// contributes its error to the reply array and the rest still run.
    async fn execute_transaction(&mut self, queue: Vec<CommandHandler>) -> DispatchResult {
        let mut responses = Vec::with_capacity(queue.len());
        let mut became_follower_link = false;

        {
            let context = ExecutionContext {
                client_id: self.client_id,
                server: &self.context,
                outbound: &self.outbound,
                can_block: false,
            };

            let mut store = self.context.store.lock().await;

            for command in &queue {
                let response = match command.handle_command(&context, &mut store).await {
                    Ok(CommandResult::Response(response)) => response,
                    Ok(CommandResult::Responses(responses)) => RespValue::Array(responses),
                    Ok(CommandResult::NoResponse) => RespValue::NullBulkString,
                    Ok(CommandResult::Block(blocked)) => blocked.into_timeout_response(),
                    Ok(CommandResult::Sync) => {
                        became_follower_link = true;
                        RespValue::NullBulkString
                    }
                    Err(e) => e.as_resp(),
                };

                self.propagate(command, &response).await;
                responses.push(response);
            }
        }

        if became_follower_link {
            self.link = LinkKind::FollowerLink;
        }

        self.refresh_subscription_state().await;

        DispatchResult::Reply(vec![RespValue::Array(responses)])
    }

    /// Retries the blocked command once. Returns its reply when it completed
    /// or timed out, `None` while it is still waiting or nothing is blocked.
    pub async fn poll_blocked(&mut self) -> Option<Vec<RespValue>> {
        let ConnectionState::Blocked { blocked, .. } = &mut self.state else {
            return None;
        };

        let mut store = self.context.store.lock().await;

        if let Some(response) = blocked.retry(&mut store) {
            let ConnectionState::Blocked { command, .. } =
                mem::replace(&mut self.state, ConnectionState::Normal)
            else {
                return None;
            };

            self.propagate(&command, &response).await;

            return self.filter_blocked_reply(response);
        }

        drop(store);

        if !blocked.has_timed_out(Instant::now()) {
            return None;
        }

        let ConnectionState::Blocked { blocked, .. } =
            mem::replace(&mut self.state, ConnectionState::Normal)
        else {
            return None;
        };

        self.filter_blocked_reply(blocked.into_timeout_response())
    }

    fn filter_blocked_reply(&self, response: RespValue) -> Option<Vec<RespValue>> {
        match self.link {
            LinkKind::Client => Some(vec![response]),
            _ => Some(Vec::new()),
        }
    }

    #[cfg(test)]
    async fn run_on(
        &self,
        command: &CommandHandler,
        store: &mut crate::key_value_store::KeyValueStore,
    ) -> RespValue {
        let context = ExecutionContext {
            client_id: self.client_id,
            server: &self.context,
            outbound: &self.outbound,
            can_block: false,
        };

        match command.handle_command(&context, store).await {
            Ok(CommandResult::Response(response)) => response,
            Ok(other) => panic!("unexpected result {:?}", other),
            Err(e) => e.as_resp(),
        }
    }
}

use std::fmt;

use bytes::Bytes;
use tokio::{
    sync::mpsc::UnboundedSender,
    time::{Duration, Instant},
};

use crate::{
    commands::{
        blpop::{BlpopArguments, blpop},
        command_error::CommandError,
        config_get::{ConfigGetArguments, config_get},
        echo::{EchoArguments, echo},
        get::{GetArguments, get},
        incr::{IncrArguments, incr},
        info::{InfoArguments, info},
        keys::{KeysArguments, keys},
        llen::{LlenArguments, llen},
        lpop::{LpopArguments, lpop},
        lrange::{LrangeArguments, lrange},
        ping::{PingArguments, ping},
        pub_sub::{
            PublishArguments, SubscribeArguments, UnsubscribeArguments, publish, subscribe,
            subscribe_ping, unsubscribe,
        },
        replication::{PsyncArguments, ReplconfArguments, WaitArguments, psync, replconf, wait},
        rpush_and_lpush::{PushArrayOperations, lpush, rpush},
        set::{SetArguments, set},
        sorted_sets::{
            ZaddArguments, ZcardArguments, ZrangeArguments, ZrankArguments, ZremArguments,
            ZscoreArguments, zadd, zcard, zrange, zrank, zrem, zscore,
        },
        type_command::{TypeArguments, type_command},
        xadd::{XaddArguments, xadd},
        xrange::{XrangeArguments, xrange},
        xread::{XreadArguments, xread},
    },
    key_value_store::KeyValueStore,
    resp::RespValue,
    server::{ClientId, ServerContext},
};

/// Commands that change the keyspace and are propagated to followers.
pub const WRITE_COMMANDS: [&str; 9] = [
    "SET", "INCR", "RPUSH", "LPUSH", "LPOP", "BLPOP", "XADD", "ZADD", "ZREM",
];

/// Retries a blocked command against the keyspace. `None` means still no data.
pub type RetryFn = Box<dyn FnMut(&mut KeyValueStore) -> Option<RespValue> + Send + Sync>;

/// A command waiting for data, polled by its connection until the retry
/// produces a reply or the deadline passes.
pub struct BlockedState {
    retry: RetryFn,
    timeout_response: RespValue,
    deadline: Option<Instant>,
}

impl BlockedState {
    /// `timeout` of `None` blocks until the retry succeeds, and so does a
    /// timeout too far out for the clock to represent.
    pub fn new(retry: RetryFn, timeout_response: RespValue, timeout: Option<Duration>) -> Self {
        Self {
            retry,
            timeout_response,
            deadline: timeout.and_then(|timeout| Instant::now().checked_add(timeout)),
        }
    }

    pub fn retry(&mut self, store: &mut KeyValueStore) -> Option<RespValue> {
        (self.retry)(store)
    }

    pub fn has_timed_out(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn into_timeout_response(self) -> RespValue {
        self.timeout_response
    }
}

impl fmt::Debug for BlockedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockedState")
            .field("timeout_response", &self.timeout_response)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum CommandResult {
    NoResponse,
    Response(RespValue),
    Responses(Vec<RespValue>),
    Block(BlockedState),
    /// The connection became a follower link; the resync frames were already
    /// queued on its outbound channel.
    Sync,
}

/// What a command may touch while it runs.
pub struct ExecutionContext<'a> {
    pub client_id: ClientId,
    pub server: &'a ServerContext,
    pub outbound: &'a UnboundedSender<Bytes>,
    /// False inside EXEC: blocking commands answer as if they timed out.
    pub can_block: bool,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CommandHandler {
    pub name: String,
    pub arguments: Vec<Bytes>,
    pub input: RespValue,
}

impl CommandHandler {
    /// Builds a handler from a decoded request, which must be a non-empty
    /// array of bulk strings. `CONFIG GET` is kept as a single command name.
    pub fn new(input: RespValue) -> Result<Self, CommandError> {
        let RespValue::Array(elements) = &input else {
            return Err(CommandError::InvalidCommandFormat);
        };

        let mut parts = Vec::with_capacity(elements.len());

        for element in elements {
            match element {
                RespValue::BulkString(part) => parts.push(part.clone()),
                _ => return Err(CommandError::InvalidCommandFormat),
            }
        }

        let Some(first) = parts.first() else {
            return Err(CommandError::InvalidCommandFormat);
        };

        let name = String::from_utf8_lossy(first).to_uppercase();

        let (name, arguments) = match name.as_str() {
            "CONFIG" => {
                let sub_command = parts
                    .get(1)
                    .map(|part| String::from_utf8_lossy(part).to_uppercase())
                    .ok_or_else(|| CommandError::WrongNumberOfArguments("config".to_string()))?;

                if sub_command != "GET" {
                    return Err(CommandError::UnknownCommand(format!("CONFIG {}", sub_command)));
                }

                ("CONFIG GET".to_string(), parts[2..].to_vec())
            }
            _ => (name, parts[1..].to_vec()),
        };

        Ok(Self {
            name,
            arguments,
            input,
        })
    }

    pub fn is_write(&self) -> bool {
        WRITE_COMMANDS.contains(&self.name.as_str())
    }

    /// Checks that the command exists and that its arguments parse, without
    /// running it. Used before queueing a command inside MULTI.
    pub fn validate_command_arguments(&self) -> Result<(), CommandError> {
        let arguments = self.arguments.as_slice();

        match self.name.as_str() {
            "PING" => PingArguments::parse(arguments).map(|_| ()),
            "ECHO" => EchoArguments::parse(arguments).map(|_| ()),
            "GET" => GetArguments::parse(arguments).map(|_| ()),
            "SET" => SetArguments::parse(arguments).map(|_| ()),
            "INCR" => IncrArguments::parse(arguments).map(|_| ()),
            "TYPE" => TypeArguments::parse(arguments).map(|_| ()),
            "KEYS" => KeysArguments::parse(arguments).map(|_| ()),
            "CONFIG GET" => ConfigGetArguments::parse(arguments).map(|_| ()),
            "INFO" => InfoArguments::parse(arguments).map(|_| ()),
            "RPUSH" => PushArrayOperations::parse(arguments, false).map(|_| ()),
            "LPUSH" => PushArrayOperations::parse(arguments, true).map(|_| ()),
            "LLEN" => LlenArguments::parse(arguments).map(|_| ()),
            "LPOP" => LpopArguments::parse(arguments).map(|_| ()),
            "LRANGE" => LrangeArguments::parse(arguments).map(|_| ()),
            "BLPOP" => BlpopArguments::parse(arguments).map(|_| ()),
            "XADD" => XaddArguments::parse(arguments).map(|_| ()),
            "XRANGE" => XrangeArguments::parse(arguments).map(|_| ()),
            "XREAD" => XreadArguments::parse(arguments).map(|_| ()),
            "ZADD" => ZaddArguments::parse(arguments).map(|_| ()),
            "ZRANK" => ZrankArguments::parse(arguments).map(|_| ()),
            "ZRANGE" => ZrangeArguments::parse(arguments).map(|_| ()),
            "ZCARD" => ZcardArguments::parse(arguments).map(|_| ()),
            "ZSCORE" => ZscoreArguments::parse(arguments).map(|_| ()),
            "ZREM" => ZremArguments::parse(arguments).map(|_| ()),
            "SUBSCRIBE" => SubscribeArguments::parse(arguments).map(|_| ()),
            "UNSUBSCRIBE" => UnsubscribeArguments::parse(arguments).map(|_| ()),
            "PUBLISH" => PublishArguments::parse(arguments).map(|_| ()),
            "REPLCONF" => ReplconfArguments::parse(arguments).map(|_| ()),
            "PSYNC" => PsyncArguments::parse(arguments).map(|_| ()),
            "WAIT" => WaitArguments::parse(arguments).map(|_| ()),
            _ => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// Runs the command against the locked keyspace.
    pub async fn handle_command(
        &self,
        context: &ExecutionContext<'_>,
        store: &mut KeyValueStore,
    ) -> Result<CommandResult, CommandError> {
        let arguments = self.arguments.as_slice();
        let server = context.server;

        match self.name.as_str() {
            "PING" => ping(arguments),
            "ECHO" => echo(arguments),
            "GET" => get(store, arguments),
            "SET" => set(store, arguments),
            "INCR" => incr(store, arguments),
            "TYPE" => type_command(store, arguments),
            "KEYS" => keys(store, arguments),
            "CONFIG GET" => config_get(&server.server, arguments),
            "INFO" => info(&server.replication, arguments).await,
            "RPUSH" => rpush(store, arguments),
            "LPUSH" => lpush(store, arguments),
            "LLEN" => llen(store, arguments),
            "LPOP" => lpop(store, arguments),
            "LRANGE" => lrange(store, arguments),
            "BLPOP" => blpop(store, arguments, context.can_block),
            "XADD" => xadd(store, arguments),
            "XRANGE" => xrange(store, arguments),
            "XREAD" => xread(store, arguments, context.can_block),
            "ZADD" => zadd(store, arguments),
            "ZRANK" => zrank(store, arguments),
            "ZRANGE" => zrange(store, arguments),
            "ZCARD" => zcard(store, arguments),
            "ZSCORE" => zscore(store, arguments),
            "ZREM" => zrem(store, arguments),
            "SUBSCRIBE" => subscribe(context.client_id, &server.pub_sub, arguments).await,
            "UNSUBSCRIBE" => unsubscribe(context.client_id, &server.pub_sub, arguments).await,
            "PUBLISH" => publish(&server.pub_sub, arguments).await,
            "REPLCONF" => replconf(context.client_id, &server.replication, arguments).await,
            "PSYNC" => {
                psync(
                    context.client_id,
                    &server.replication,
                    store,
                    context.outbound,
                    arguments,
                )
                .await
            }
            "WAIT" => {
                wait(
                    context.client_id,
                    &server.replication,
                    arguments,
                    context.can_block,
                )
                .await
            }
            _ => Err(CommandError::UnknownCommand(self.name.clone())),
        }
    }

    /// WAIT parks until followers acknowledge, and the acknowledgements
    /// arrive as REPLCONF on other connections, so neither may hold the
    /// keyspace lock outside a transaction.
    pub fn runs_without_store(&self) -> bool {
        matches!(self.name.as_str(), "WAIT" | "REPLCONF")
    }

    /// Runs a command for which [`Self::runs_without_store`] holds.
    pub async fn handle_storeless_command(
        &self,
        context: &ExecutionContext<'_>,
    ) -> Result<CommandResult, CommandError> {
        let replication = &context.server.replication;

        match self.name.as_str() {
            "REPLCONF" => replconf(context.client_id, replication, &self.arguments).await,
            "WAIT" => {
                wait(
                    context.client_id,
                    replication,
                    &self.arguments,
                    context.can_block,
                )
                .await
            }
            _ => Err(CommandError::Internal(format!(
                "{} needs the keyspace",
                self.name
            ))),
        }
    }

    /// The PING reply while the connection is subscribed to channels.
    pub fn handle_subscribed_ping(&self) -> Result<CommandResult, CommandError> {
        subscribe_ping(&self.arguments)
    }

    /// The form of this command sent to followers once it produced
    /// `response`, or `None` when it changed nothing.
    ///
    /// BLPOP is sent as the `LPOP` of the key it popped from and XADD carries
    /// the id it resolved to, so followers neither block nor pick ids of
    /// their own.
    pub fn propagated_form(&self, response: &RespValue) -> Option<RespValue> {
        if !self.is_write() || response.is_error() {
            return None;
        }

        match (self.name.as_str(), response) {
            (_, RespValue::NullArray | RespValue::NullBulkString) => None,
            ("BLPOP", RespValue::Array(popped)) => match popped.first() {
                Some(RespValue::BulkString(key)) => Some(RespValue::array_of_bulk_strings([
                    Bytes::from_static(b"LPOP"),
                    key.clone(),
                ])),
                _ => None,
            },
            ("XADD", RespValue::BulkString(id)) => {
                let mut parts = vec![Bytes::from_static(b"XADD")];
                parts.extend(self.arguments.iter().cloned());
                parts[2] = id.clone();

                Some(RespValue::array_of_bulk_strings(parts))
            }
            _ => Some(self.input.clone()),
        }
    }
}

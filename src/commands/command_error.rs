use thiserror::Error;

use crate::{key_value_store::WrongTypeError, resp::RespValue, stream::StreamError};

/// Errors reported back to the caller as RESP error replies. None of them
/// close the connection.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum CommandError {
    #[error("ERR invalid command format")]
    InvalidCommandFormat,
    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongNumberOfArguments(String),
    #[error("ERR syntax error")]
    SyntaxError,
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,
    #[error("ERR increment or decrement would overflow")]
    Overflow,
    #[error("ERR value is not a valid float")]
    NotAValidFloat,
    #[error("ERR timeout is not a float or out of range")]
    InvalidTimeout,
    #[error("ERR timeout is negative")]
    NegativeTimeout,
    #[error("ERR invalid expire time in 'set' command")]
    InvalidExpireTime,
    #[error("{0}")]
    Stream(#[from] StreamError),
    #[error("ERR Unbalanced 'xread' list of streams: for each stream key an ID or '$' must be specified.")]
    UnbalancedStreams,
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,
    #[error("ERR EXEC without MULTI")]
    ExecWithoutMulti,
    #[error("ERR DISCARD without MULTI")]
    DiscardWithoutMulti,
    #[error(
        "ERR Can't execute '{0}': only (P|S)SUBSCRIBE / (P|S)UNSUBSCRIBE / PING / QUIT / RESET are allowed in this context"
    )]
    NotAllowedInSubscribedMode(String),
    #[error("READONLY You can't write against a read only replica.")]
    ReadOnlyReplica,
    #[error("ERR WAIT cannot be used with replica instances.")]
    WaitOnReplica,
    #[error("ERR PSYNC is only supported with '? -1' on a master")]
    InvalidPsyncArguments,
    #[error("ERR Unrecognized REPLCONF option: {0}")]
    UnknownReplconfOption(String),
    #[error("ERR invalid glob pattern: {0}")]
    InvalidGlobPattern(String),
    #[error("ERR {0}")]
    Internal(String),
}

impl CommandError {
    pub fn as_resp(&self) -> RespValue {
        RespValue::Error(self.to_string())
    }
}

impl From<WrongTypeError> for CommandError {
    fn from(_: WrongTypeError) -> Self {
        CommandError::WrongType
    }
}

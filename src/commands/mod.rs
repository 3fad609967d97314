mod blpop;
mod command_dispatcher;
mod command_error;
mod command_handler;
pub mod command_utils;
mod config_get;
mod echo;
mod get;
mod incr;
mod info;
mod keys;
mod llen;
mod lpop;
mod lrange;
mod ping;
mod pub_sub;
mod replication;
mod rpush_and_lpush;
mod set;
mod sorted_sets;
mod type_command;
mod xadd;
mod xrange;
mod xread;

pub use command_dispatcher::{CommandDispatcher, DispatchResult, LinkKind};
pub use command_error::CommandError;
pub use command_handler::{BlockedState, CommandHandler, CommandResult, ExecutionContext};

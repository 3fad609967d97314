//! PSYNC command implementation for Redis replication synchronization.
//!
//! Only full resynchronization is supported: the follower asks with
//! `PSYNC ? -1` and receives the leader's replication id, its offset and a
//! snapshot of the keyspace.

use bytes::Bytes;
use tokio::sync::mpsc::UnboundedSender;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    key_value_store::KeyValueStore,
    rdb,
    replication::ReplicationCoordinator,
    server::ClientId,
};

/// Represents the parsed arguments for the PSYNC command.
pub struct PsyncArguments;

impl PsyncArguments {
    /// Parses and validates arguments for the PSYNC command.
    ///
    /// # Arguments
    ///
    /// * `arguments` - `[replication_id, offset]`, which must be `["?", "-1"]`
    ///
    /// # Returns
    ///
    /// * `Ok(PsyncArguments)` - For the full resynchronization request
    /// * `Err(CommandError::WrongNumberOfArguments)` - If not exactly 2 arguments
    /// * `Err(CommandError::InvalidPsyncArguments)` - For any other id or offset
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("psync", arguments, 2, Some(2))?;

        if arguments[0].as_ref() != b"?" || arguments[1].as_ref() != b"-1" {
            return Err(CommandError::InvalidPsyncArguments);
        }

        Ok(Self)
    }
}

/// Handles the Redis PSYNC command.
///
/// Sends `+FULLRESYNC <repl_id> <offset>` followed by the snapshot frame on
/// the connection's outbound channel and turns the connection into a
/// follower link. Both happen while the caller holds the keyspace lock, so
/// the follower receives every write made after the snapshot and none made
/// before it.
pub async fn psync(
    client_id: ClientId,
    replication: &ReplicationCoordinator,
    store: &KeyValueStore,
    outbound: &UnboundedSender<Bytes>,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    PsyncArguments::parse(arguments)?;

    if !replication.role().is_master() {
        return Err(CommandError::InvalidPsyncArguments);
    }

    let snapshot = rdb::serialize(store);

    replication
        .attach_follower(client_id, outbound.clone(), snapshot)
        .await
        .map_err(|_| CommandError::Internal("connection closed during resync".to_string()))?;

    Ok(CommandResult::Sync)
}

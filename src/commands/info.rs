use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    replication::ReplicationCoordinator,
    resp::RespValue,
};

pub struct InfoArguments;

impl InfoArguments {
    /// Any section name is accepted; only the replication section exists.
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("info", arguments, 0, Some(1))?;

        Ok(InfoArguments)
    }
}

pub async fn info(
    replication: &ReplicationCoordinator,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    InfoArguments::parse(arguments)?;

    let mut lines = vec!["# Replication".to_string()];
    lines.extend(replication.info().await);

    Ok(CommandResult::Response(RespValue::bulk_string(
        lines.join("\r\n"),
    )))
}

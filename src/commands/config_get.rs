use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    resp::RespValue,
    server::RedisServer,
};

pub struct ConfigGetArguments {
    parameters: Vec<Bytes>,
}

impl ConfigGetArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("config|get", arguments, 1, None)?;

        Ok(ConfigGetArguments {
            parameters: arguments.to_vec(),
        })
    }
}

/// Replies with a flat `[name, value, ...]` array. Unknown parameter names
/// are left out of the reply.
pub fn config_get(
    server: &RedisServer,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let config_get_arguments = ConfigGetArguments::parse(arguments)?;
    let mut response = Vec::new();

    for parameter in config_get_arguments.parameters {
        let value = match parameter.to_ascii_lowercase().as_slice() {
            b"dir" => server.rdb_directory.clone(),
            b"dbfilename" => server.rdb_filename.clone(),
            b"port" => server.port.to_string(),
            _ => continue,
        };

        response.push(RespValue::bulk_string(parameter.to_ascii_lowercase()));
        response.push(RespValue::bulk_string(value));
    }

    Ok(CommandResult::Response(RespValue::Array(response)))
}

use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    pub_sub::PubSubRegistry,
    resp::RespValue,
    server::ClientId,
};

pub struct SubscribeArguments {
    pub channels: Vec<Bytes>,
}

impl SubscribeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("subscribe", arguments, 1, None)?;

        Ok(Self {
            channels: arguments.to_vec(),
        })
    }
}

/// Subscribes to every channel given. Each channel gets its own
/// `["subscribe", channel, count]` confirmation, `count` being the number of
/// channels the client is subscribed to after that step.
pub async fn subscribe(
    client_id: ClientId,
    pub_sub: &PubSubRegistry,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let subscribe_arguments = SubscribeArguments::parse(arguments)?;
    let mut responses = Vec::with_capacity(subscribe_arguments.channels.len());

    for channel in subscribe_arguments.channels {
        let count = pub_sub.subscribe(client_id, channel.clone()).await;

        responses.push(RespValue::Array(vec![
            RespValue::bulk_string("subscribe"),
            RespValue::BulkString(channel),
            RespValue::Integer(count as i64),
        ]));
    }

    Ok(CommandResult::Responses(responses))
}

use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult},
    pub_sub::PubSubRegistry,
    resp::RespValue,
    server::ClientId,
};

pub struct UnsubscribeArguments {
    /// No channels means every channel the client is subscribed to
    pub channels: Vec<Bytes>,
}

impl UnsubscribeArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        Ok(Self {
            channels: arguments.to_vec(),
        })
    }
}

pub async fn unsubscribe(
    client_id: ClientId,
    pub_sub: &PubSubRegistry,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let mut unsubscribe_arguments = UnsubscribeArguments::parse(arguments)?;

    if unsubscribe_arguments.channels.is_empty() {
        unsubscribe_arguments.channels = pub_sub.channels_of(client_id).await;
    }

    if unsubscribe_arguments.channels.is_empty() {
        return Ok(CommandResult::Response(RespValue::Array(vec![
            RespValue::bulk_string("unsubscribe"),
            RespValue::NullBulkString,
            RespValue::Integer(0),
        ])));
    }

    let mut responses = Vec::with_capacity(unsubscribe_arguments.channels.len());

    for channel in unsubscribe_arguments.channels {
        let count = pub_sub.unsubscribe(client_id, &channel).await;

        responses.push(RespValue::Array(vec![
            RespValue::bulk_string("unsubscribe"),
            RespValue::BulkString(channel),
            RespValue::Integer(count as i64),
        ]));
    }

    Ok(CommandResult::Responses(responses))
}

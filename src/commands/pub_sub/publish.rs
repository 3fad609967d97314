use bytes::Bytes;

use crate::{
    commands::{CommandError, CommandResult, command_utils::check_arity},
    pub_sub::PubSubRegistry,
    resp::RespValue,
};

pub struct PublishArguments {
    pub channel: Bytes,
    pub message: Bytes,
}

impl PublishArguments {
    pub fn parse(arguments: &[Bytes]) -> Result<Self, CommandError> {
        check_arity("publish", arguments, 2, Some(2))?;

        Ok(Self {
            channel: arguments[0].clone(),
            message: arguments[1].clone(),
        })
    }
}

/// Replies with the number of subscribers the message was delivered to.
pub async fn publish(
    pub_sub: &PubSubRegistry,
    arguments: &[Bytes],
) -> Result<CommandResult, CommandError> {
    let publish_arguments = PublishArguments::parse(arguments)?;

    let receivers = pub_sub
        .publish(&publish_arguments.channel, publish_arguments.message)
        .await;

    Ok(CommandResult::Response(RespValue::Integer(receivers as i64)))
}

mod ping;
mod publish;
mod subscribe;
mod unsubscribe;

pub use ping::{SubscribePingArguments, subscribe_ping};
pub use publish::{PublishArguments, publish};
pub use subscribe::{SubscribeArguments, subscribe};
pub use unsubscribe::{UnsubscribeArguments, unsubscribe};

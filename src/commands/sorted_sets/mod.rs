mod zadd;
mod zcard;
mod zrange;
mod zrank;
mod zrem;
mod zscore;

pub use zadd::{ZaddArguments, zadd};
pub use zcard::{ZcardArguments, zcard};
pub use zrange::{ZrangeArguments, zrange};
pub use zrank::{ZrankArguments, zrank};
pub use zrem::{ZremArguments, zrem};
pub use zscore::{ZscoreArguments, zscore};

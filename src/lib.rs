//! A Redis server implementation in Rust.
//!
//! This crate provides a Redis-compatible server implementation that supports
//! core Redis functionality including:
//!
//! - Basic key-value operations (GET, SET, INCR, KEYS, TYPE)
//! - List operations (LPUSH, RPUSH, LPOP, BLPOP, LRANGE, LLEN)
//! - Stream operations (XADD, XRANGE, XREAD)
//! - Sorted set operations (ZADD, ZRANK, ZRANGE, ZCARD, ZSCORE, ZREM)
//! - Transactions (MULTI, EXEC, DISCARD)
//! - Pub/sub (SUBSCRIBE, UNSUBSCRIBE, PUBLISH)
//! - Leader/follower replication with WAIT
//! - Loading RDB snapshots at startup
//!
//! The server uses the Redis Serialization Protocol (RESP) for client communication
//! and supports concurrent connections through async/await with Tokio.

pub mod commands;
pub mod connection;
pub mod handshake;
pub mod input;
pub mod key_value_store;
pub mod pub_sub;
pub mod rdb;
pub mod replication;
pub mod resp;
pub mod server;
pub mod sorted_set;
pub mod stream;

//! Follower side of the replication handshake.
//!
//! The follower sends, waiting for each reply:
//!
//! 1. `PING`, expecting `+PONG`
//! 2. `REPLCONF listening-port <port>`, expecting `+OK`
//! 3. `REPLCONF capa psync2`, expecting `+OK`
//! 4. `PSYNC ? -1`, expecting `+FULLRESYNC <replid> <offset>`
//!
//! and then reads the snapshot, which replaces the local keyspace.

use regex::Regex;
use thiserror::Error;
use tokio::{io::AsyncWriteExt, net::TcpStream};
use tracing::info;

use crate::{
    input::{CommandReadError, FrameReader},
    rdb::{self, RdbError},
    replication::REPLICATION_ID_LENGTH,
    resp::RespValue,
    server::ServerContext,
};

#[derive(Error, Debug)]
pub enum ReplicationError {
    #[error("Failed to connect to leader {address}: {source}")]
    Connect {
        address: String,
        source: std::io::Error,
    },
    #[error("Failed to write to leader: {0}")]
    Write(#[from] std::io::Error),
    #[error("Failed to read from leader: {0}")]
    Read(#[from] CommandReadError),
    #[error("Unexpected reply to {command}: {reply:?}")]
    UnexpectedReply {
        command: &'static str,
        reply: RespValue,
    },
    #[error("Invalid FULLRESYNC reply '{0}'")]
    InvalidFullResync(String),
    #[error("Invalid snapshot from leader: {0}")]
    Snapshot(#[from] RdbError),
}

/// Connects to the leader and performs the handshake. The returned reader
/// keeps any bytes the leader sent after the snapshot.
pub async fn handshake(
    host: &str,
    port: u16,
    listening_port: u16,
    context: &ServerContext,
) -> Result<FrameReader<TcpStream>, ReplicationError> {
    let address = format!("{}:{}", host, port);

    let stream = TcpStream::connect(&address)
        .await
        .map_err(|source| ReplicationError::Connect {
            address: address.clone(),
            source,
        })?;

    info!(%address, "connected to leader");

    let mut frames = FrameReader::new(stream);
    let listening_port = listening_port.to_string();

    expect_simple_string(&mut frames, &["PING"], "PING", "PONG").await?;
    expect_simple_string(
        &mut frames,
        &["REPLCONF", "listening-port", &listening_port],
        "REPLCONF listening-port",
        "OK",
    )
    .await?;
    expect_simple_string(
        &mut frames,
        &["REPLCONF", "capa", "psync2"],
        "REPLCONF capa",
        "OK",
    )
    .await?;

    let reply = send_command(&mut frames, &["PSYNC", "?", "-1"]).await?;
    let RespValue::SimpleString(full_resync) = &reply else {
        return Err(ReplicationError::UnexpectedReply {
            command: "PSYNC",
            reply,
        });
    };

    let (repl_id, offset) = parse_full_resync(full_resync)?;
    info!(repl_id, offset, "full resync accepted");

    let snapshot = frames.read_snapshot().await?;
    let entries = rdb::parse(&snapshot)?;
    let keys = entries.len();

    context.store.lock().await.replace_all(entries);
    info!(keys, "loaded snapshot from leader");

    Ok(frames)
}

async fn send_command(
    frames: &mut FrameReader<TcpStream>,
    parts: &[&str],
) -> Result<RespValue, ReplicationError> {
    let stream = frames.get_mut();
    stream.write_all(&RespValue::command(parts).encode()).await?;
    stream.flush().await?;

    Ok(frames.read_frame().await?)
}

async fn expect_simple_string(
    frames: &mut FrameReader<TcpStream>,
    parts: &[&str],
    command: &'static str,
    expected: &str,
) -> Result<(), ReplicationError> {
    match send_command(frames, parts).await? {
        RespValue::SimpleString(reply) if reply.eq_ignore_ascii_case(expected) => Ok(()),
        reply => Err(ReplicationError::UnexpectedReply { command, reply }),
    }
}

/// Splits `FULLRESYNC <replid> <offset>` into the leader's replication id and
/// offset.
fn parse_full_resync(reply: &str) -> Result<(String, u64), ReplicationError> {
    let invalid = || ReplicationError::InvalidFullResync(reply.to_string());

    let pattern = format!(r"^FULLRESYNC ([a-zA-Z0-9]{{{}}}) (\d+)$", REPLICATION_ID_LENGTH);
    let regex = Regex::new(&pattern).map_err(|_| invalid())?;

    let captures = regex.captures(reply).ok_or_else(invalid)?;
    let offset = captures[2].parse::<u64>().map_err(|_| invalid())?;

    Ok((captures[1].to_string(), offset))
}

//! Server configuration, shared state and the accept loop.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use clap::Parser;
use thiserror::Error;
use tokio::{net::TcpListener, sync::Mutex};
use tracing::{error, info};

use crate::{
    connection::{handle_connection, handle_leader_link},
    handshake::{ReplicationError, handshake},
    key_value_store::KeyValueStore,
    pub_sub::PubSubRegistry,
    rdb,
    replication::{RedisRole, ReplicationCoordinator, run_broadcaster},
};

/// Identifies a connection for pub/sub, WAIT and follower bookkeeping.
pub type ClientId = u64;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("Invalid --replicaof value '{0}', expected \"<host> <port>\"")]
    InvalidReplicaOf(String),
}

#[derive(Parser, Debug)]
#[command(name = "redis-server", about = "A Redis compatible server")]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 6379)]
    port: u16,
    /// Leader to follow, as "<host> <port>"
    #[arg(long)]
    replicaof: Option<String>,
    /// Directory holding the snapshot file
    #[arg(long, default_value = ".")]
    dir: String,
    /// Snapshot file name
    #[arg(long, default_value = "dump.rdb")]
    dbfilename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedisServer {
    pub port: u16,
    pub role: RedisRole,
    pub rdb_directory: String,
    pub rdb_filename: String,
}

impl RedisServer {
    /// Builds the configuration from command line arguments. The first
    /// element is the program name.
    pub fn new<I: IntoIterator<Item = String>>(command_line_args: I) -> Result<Self, CliError> {
        let cli = Cli::try_parse_from(command_line_args)
            .map_err(|e| CliError::InvalidArguments(e.to_string()))?;

        let role = match cli.replicaof {
            Some(replica_of) => parse_replica_of(&replica_of)?,
            None => RedisRole::Master,
        };

        Ok(RedisServer {
            port: cli.port,
            role,
            rdb_directory: cli.dir,
            rdb_filename: cli.dbfilename,
        })
    }
}

fn parse_replica_of(value: &str) -> Result<RedisRole, CliError> {
    let invalid = || CliError::InvalidReplicaOf(value.to_string());
    let mut parts = value.split_whitespace();

    let (Some(host), Some(port), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(invalid());
    };

    let port = port.parse::<u16>().map_err(|_| invalid())?;

    Ok(RedisRole::Replica {
        host: host.to_string(),
        port,
    })
}

/// Everything a connection shares with the rest of the process.
#[derive(Clone)]
pub struct ServerContext {
    pub server: Arc<RedisServer>,
    pub store: Arc<Mutex<KeyValueStore>>,
    pub pub_sub: Arc<PubSubRegistry>,
    pub replication: Arc<ReplicationCoordinator>,
    next_client_id: Arc<AtomicU64>,
}

impl ServerContext {
    pub fn new(server: RedisServer, store: KeyValueStore) -> Self {
        let replication = ReplicationCoordinator::new(server.role.clone());

        ServerContext {
            server: Arc::new(server),
            store: Arc::new(Mutex::new(store)),
            pub_sub: Arc::new(PubSubRegistry::new()),
            replication: Arc::new(replication),
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn next_client_id(&self) -> ClientId {
        self.next_client_id.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },
    #[error(transparent)]
    Replication(#[from] ReplicationError),
}

/// Loads the snapshot, binds the listener and, on a follower, completes the
/// handshake with the leader before any client is accepted.
pub async fn start(server: RedisServer) -> Result<(TcpListener, ServerContext), StartupError> {
    let entries = rdb::load(&server.rdb_directory, &server.rdb_filename).await;
    let port = server.port;
    let context = ServerContext::new(server, KeyValueStore::from_entries(entries));

    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    let local_port = listener.local_addr().map_or(port, |address| address.port());

    info!(
        port = local_port,
        role = context.replication.role().as_str(),
        "listening"
    );

    if let RedisRole::Replica { host, port } = context.replication.role().clone() {
        let frames = handshake(&host, port, local_port, &context).await?;
        tokio::spawn(handle_leader_link(frames, context.clone()));
    }

    tokio::spawn(run_broadcaster(Arc::clone(&context.replication)));

    Ok((listener, context))
}

/// Accepts connections until the listener fails.
pub async fn serve(listener: TcpListener, context: ServerContext) {
    loop {
        match listener.accept().await {
            Ok((stream, address)) => {
                info!(%address, "accepted connection");
                tokio::spawn(handle_connection(stream, context.clone()));
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

use anyhow::Result;
use redis_server::server::{RedisServer, serve, start};

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("redis_server=info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let server = RedisServer::new(std::env::args())?;
    let (listener, context) = start(server).await?;

    serve(listener, context).await;

    Ok(())
}

//! Per-connection tasks.
//!
//! Every connection gets a reader loop feeding its [`CommandDispatcher`] and
//! a writer task draining an unbounded channel. Replies, pub/sub messages
//! and propagated writes all go through that channel, so they reach the
//! socket in the order they were produced.

use std::sync::Arc;

use bytes::Bytes;
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    time::{Duration, MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    commands::{CommandDispatcher, DispatchResult, LinkKind},
    input::{CommandReadError, FrameReader},
    resp::RespValue,
    server::{ClientId, ServerContext},
};

/// How often a blocked command is retried.
pub const BLOCKED_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Serves a client connection until it closes.
pub async fn handle_connection(stream: TcpStream, context: ServerContext) {
    let (reader, writer) = stream.into_split();
    serve_link(FrameReader::new(reader), writer, LinkKind::Client, context).await;
}

/// Applies the write stream a follower receives from its leader after the
/// handshake. `frames` may already hold commands sent right after the
/// snapshot.
pub async fn handle_leader_link(frames: FrameReader<TcpStream>, context: ServerContext) {
    let (stream, buffered) = frames.into_parts();
    let (reader, writer) = stream.into_split();

    serve_link(
        FrameReader::with_buffered(reader, &buffered),
        writer,
        LinkKind::LeaderLink,
        context,
    )
    .await;

    warn!("leader link closed");
}

async fn serve_link(
    mut frames: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    link: LinkKind,
    context: ServerContext,
) {
    let client_id = context.next_client_id();
    let (outbound, receiver) = unbounded_channel::<Bytes>();
    let writer_task = tokio::spawn(write_outbound(client_id, writer, receiver));

    let delivery = outbound.clone();
    context
        .pub_sub
        .register_client(client_id, Arc::new(move |frame| delivery.send(frame).is_ok()))
        .await;

    let mut dispatcher =
        CommandDispatcher::new(client_id, link, context.clone(), outbound.clone());

    match read_commands(&mut frames, &mut dispatcher, &outbound, &context).await {
        Ok(()) | Err(CommandReadError::ConnectionClosed) => (),
        Err(CommandReadError::Protocol(e)) => {
            warn!(client_id, "Protocol error: {}", e);
            send(&outbound, e.as_resp());
        }
        Err(CommandReadError::Io(e)) => {
            warn!(client_id, "Failed to read from connection: {}", e);
        }
    }

    context.pub_sub.unregister_client(client_id).await;
    context.replication.remove_follower(client_id).await;

    drop(dispatcher);
    drop(outbound);

    if let Err(e) = writer_task.await {
        warn!(client_id, "Writer task failed: {}", e);
    }

    info!(client_id, "connection closed");
}

async fn read_commands(
    frames: &mut FrameReader<OwnedReadHalf>,
    dispatcher: &mut CommandDispatcher,
    outbound: &UnboundedSender<Bytes>,
    context: &ServerContext,
) -> Result<(), CommandReadError> {
    // Kept across iterations so steady input cannot starve the retries.
    let mut poll = interval(BLOCKED_POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // While blocked, input is buffered but not parsed.
        if dispatcher.is_blocked() {
            tokio::select! {
                read = frames.fill() => {
                    read?;
                }
                _ = poll.tick() => {
                    if let Some(replies) = dispatcher.poll_blocked().await {
                        replies.into_iter().for_each(|reply| send(outbound, reply));
                    }
                }
            }

            continue;
        }

        while let Some((input, consumed)) = frames.next_frame()? {
            let result = dispatcher.dispatch(input).await;

            if dispatcher.link() == LinkKind::LeaderLink {
                context.replication.add_processed_bytes(consumed).await;
            }

            match result {
                DispatchResult::Reply(replies) => {
                    replies.into_iter().for_each(|reply| send(outbound, reply));
                }
                DispatchResult::Blocked => break,
                DispatchResult::Close(reply) => {
                    send(outbound, reply);
                    return Ok(());
                }
            }
        }

        if !dispatcher.is_blocked() {
            frames.fill().await?;
        }
    }
}

fn send(outbound: &UnboundedSender<Bytes>, reply: RespValue) {
    // The writer only stops once the socket failed, which it already logged.
    let _ = outbound.send(reply.encode());
}

async fn write_outbound(
    client_id: ClientId,
    mut writer: OwnedWriteHalf,
    mut receiver: UnboundedReceiver<Bytes>,
) {
    while let Some(frame) = receiver.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            warn!(client_id, "Failed to write to connection: {}", e);
            return;
        }
    }

    if let Err(e) = writer.shutdown().await {
        debug!(client_id, "Failed to shut down connection: {}", e);
    }
}

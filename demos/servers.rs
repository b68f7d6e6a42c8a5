//! # Servers Example
//!
//! A TCP ping server and a background worker run until Ctrl-C (or SIGTERM).
//! The server stops accepting on shutdown and waits for in-flight
//! connections, bounded by the group's shutdown deadline.
//!
//! ## Run
//! ```bash
//! cargo run --example servers --features logging
//! # in another terminal
//! nc 127.0.0.1 7878
//! ```

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use gracevisor::{BoxError, Config, Context, Group, LogWriter, Process, Subscribe};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Answers every line with `pong`.
struct PingServer {
    addr: &'static str,
    stop: CancellationToken,
    /// Cancelled once every connection has been closed.
    drained: CancellationToken,
}

impl PingServer {
    fn new(addr: &'static str) -> Self {
        Self {
            addr,
            stop: CancellationToken::new(),
            drained: CancellationToken::new(),
        }
    }

    async fn serve_conn(stream: TcpStream, stop: CancellationToken) -> std::io::Result<()> {
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(_) => write.write_all(b"pong\n").await?,
                    None => return Ok(()),
                },
                _ = stop.cancelled() => {
                    write.write_all(b"bye\n").await?;
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl Process for PingServer {
    fn name(&self) -> &str {
        "ping-server"
    }

    async fn start(&self) -> Result<(), BoxError> {
        let listener = TcpListener::bind(self.addr).await?;
        info!(addr = self.addr, "listening");

        let mut conns = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    debug!(%peer, "connection accepted");
                    conns.spawn(Self::serve_conn(stream, self.stop.clone()));
                }
                _ = self.stop.cancelled() => break,
            }
        }

        while let Some(res) = conns.join_next().await {
            if let Ok(Err(err)) = res {
                warn!(error = %err, "connection ended with error");
            }
        }
        self.drained.cancel();
        Ok(())
    }

    async fn shutdown(&self, ctx: Context) -> Result<(), BoxError> {
        self.stop.cancel();
        tokio::select! {
            _ = self.drained.cancelled() => Ok(()),
            cause = ctx.done() => Err(cause.into()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,gracevisor=debug".into()),
        )
        .init();

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let cfg = Config::default().with_shutdown_timeout(Duration::from_secs(3));
    let group = Group::builder(cfg).with_subscribers(subs).build();

    group.add_process(Arc::new(PingServer::new("127.0.0.1:7878")));

    let worker_stop = CancellationToken::new();
    let worker_token = worker_stop.clone();
    group.add_named(
        "heartbeat",
        move || {
            let token = worker_token.clone();
            async move {
                let mut beats = 0u64;
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(1)) => {
                            beats += 1;
                            debug!(beats, "heartbeat");
                        }
                        _ = token.cancelled() => return Ok(()),
                    }
                }
            }
        },
        move |_ctx: Context| {
            let stop = worker_stop.clone();
            async move {
                stop.cancel();
                Ok(())
            }
        },
    );

    let ctx = Context::with_shutdown_signal(&Context::new());
    info!("press Ctrl-C to stop");
    group.wait(&ctx).await?;
    info!("bye");
    Ok(())
}

use async_network::Builder;
use async_network::Connection;
use async_network::ConnectionDelegate;
use async_network::Dispatcher;
use async_network::Error;
use async_network::MemoryConnection;
use async_network::Tag;
use bytes::Bytes;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::mem;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const ROUNDS: Tag = 32;

struct Peer {
    name: &'static str,
    echo: bool,
    closed: bool,
    received: usize,
    pending: Vec<(Bytes, Tag)>,
}

impl Peer {
    fn new(name: &'static str, echo: bool) -> Self {
        Self { name, echo, closed: false, received: 0, pending: Vec::new() }
    }
}

impl ConnectionDelegate<Bytes> for Peer {
    fn connect_done(&mut self, connection: Arc<dyn Connection>) {
        info!(peer = self.name, "connected: {}", connection);
    }

    fn connect_terminate(&mut self, connection: Arc<dyn Connection>) {
        info!(peer = self.name, "disconnected: {}", connection);
        self.closed = true;
    }

    fn receive_done(&mut self, _connection: Arc<dyn Connection>, object: Bytes, tag: Tag) {
        debug!(peer = self.name, tag, len = object.len(), "received");
        self.received += 1;
        if self.echo {
            self.pending.push((object, tag));
        }
    }

    fn send_done(&mut self, _connection: Arc<dyn Connection>, tag: Tag) {
        debug!(peer = self.name, tag, "sent");
    }

    fn connect_fatal(&mut self, connection: Arc<dyn Connection>, err: Error) {
        warn!(peer = self.name, "{}: {}", connection, err);
    }
}

async fn drain(dispatcher: &mut Dispatcher<Bytes, Peer>) {
    let _ = time::timeout(Duration::from_secs(1), async {
        while !dispatcher.delegate().closed {
            dispatcher.next().await;
        }
    }).await;
    dispatcher.dispatch();
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let mut client = Builder::default().build(Peer::new("client", false));
    let mut server = Builder::default().build(Peer::new("server", true));
    let (local, remote) = MemoryConnection::pair(&client, &server);

    for connection in [&remote, &local] {
        if let Err(err) = connection.start().await {
            error!("start failed: {}", err);
            return;
        }
    }

    let (shutdown_sender, mut shutdown_receiver) = mpsc::channel(1);
    thread::spawn(move || {
        let reader = BufReader::new(io::stdin());
        for line in reader.lines().map_while(|line| line.ok()) {
            if line.eq("stop") {
                let _ = shutdown_sender.blocking_send(());
                return;
            }
        }
    });

    let mut tag: Tag = 0;
    let mut ticker = time::interval(Duration::from_millis(50));
    while tag < ROUNDS {
        select! {
            Some(()) = shutdown_receiver.recv() => break,
            _ = ticker.tick() => {
                tag += 1;
                let payload = Bytes::from(format!("ping {}", tag));
                if let Err(err) = local.send(payload, tag).await {
                    warn!("send failed: {}", err);
                    break;
                }
            }
        }

        client.dispatch();
        server.dispatch();
        for (object, tag) in mem::take(&mut server.delegate_mut().pending) {
            if let Err(err) = remote.send(object, tag).await {
                warn!("echo failed: {}", err);
            }
        }
    }

    local.disconnect();
    drain(&mut client).await;
    drain(&mut server).await;

    info!(
        sent = tag,
        echoed = client.delegate().received,
        "done"
    );
}

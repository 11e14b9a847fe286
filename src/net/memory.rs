use crate::Error;
use crate::ErrorKind;
use crate::Result;
use crate::Tag;
use crate::State;
use crate::Emitter;
use crate::Dispatcher;
use crate::Connection;
use crate::ConnectionId;
use crate::AsyncConnection;
use crate::ConnectionDelegate;
use async_trait::async_trait;
use tokio::select;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Sender as MpscSender;
use tokio::sync::mpsc::Receiver as MpscReceiver;
use tokio::sync::broadcast;
use tokio::sync::broadcast::Sender as BroadcastSender;
use tokio::sync::broadcast::Receiver as BroadcastReceiver;
use tracing::debug;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::fmt::Debug;
use std::fmt::Display;

const DEFAULT_EVENTS: usize = 16;

type Inbox<P> = (MpscReceiver<(P, Tag)>, BroadcastReceiver<()>);

/// One end of an in-process connection pair.
///
/// Objects sent on one end are received on the other in send order. There is
/// no socket and no wire format; the pair exists so that observers can be
/// exercised against a connection that honors the event contract.
///
/// Disconnecting either end closes both, and fails any send that is still
/// waiting for room in the peer's inbox.
pub struct MemoryConnection<P> {
    id: ConnectionId,
    emitter: Emitter<P>,
    outbound: MpscSender<(P, Tag)>,
    inbox: Mutex<Option<Inbox<P>>>,
    closed: Arc<AtomicBool>,
    terminate: BroadcastSender<()>,
}

impl<P> Debug for MemoryConnection<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Connection: {{ id:{}, state:{:?}, closed:{} }}",
            self.id,
            self.emitter.state(),
            self.closed.load(Ordering::SeqCst)
        )
    }
}

impl<P> Display for MemoryConnection<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl<P> Connection for MemoryConnection<P>
where
    P: Send + 'static,
{
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        State::Connected == self.emitter.state() && !self.closed.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(connection = %self.id, "disconnect");
            let _ = self.terminate.send(());
        }
    }
}

#[async_trait]
impl<P> AsyncConnection<P> for MemoryConnection<P>
where
    P: Send + 'static,
{
    async fn send(&self, object: P, tag: Tag) -> Result<()> {
        MemoryConnection::send(self, object, tag).await
    }
}

impl<P> MemoryConnection<P>
where
    P: Send + 'static,
{
    /// Links two endpoints whose events go to `local` and `remote`.
    ///
    /// Neither end raises anything until `start` is called on it.
    pub fn pair<D1, D2>(local: &Dispatcher<P, D1>, remote: &Dispatcher<P, D2>) -> (Arc<Self>, Arc<Self>)
    where
        D1: ConnectionDelegate<P>,
        D2: ConnectionDelegate<P>,
    {
        let (ltx, lrx) = mpsc::channel(DEFAULT_EVENTS);
        let (rtx, rrx) = mpsc::channel(DEFAULT_EVENTS);
        let (terminate, _) = broadcast::channel(1);
        let closed = Arc::new(AtomicBool::new(false));

        let first = Self::new(local, rtx, (lrx, terminate.subscribe()), closed.clone(), terminate.clone());
        let second = Self::new(remote, ltx, (rrx, terminate.subscribe()), closed, terminate);
        (first, second)
    }

    fn new<D>(dispatcher: &Dispatcher<P, D>, outbound: MpscSender<(P, Tag)>, inbox: Inbox<P>,
        closed: Arc<AtomicBool>, terminate: BroadcastSender<()>) -> Arc<Self>
    where
        D: ConnectionDelegate<P>,
    {
        Arc::new_cyclic(|weak: &Weak<Self>| {
            let connection: Weak<dyn Connection> = weak.clone();
            Self {
                id: ConnectionId::next(),
                emitter: dispatcher.emitter(connection),
                outbound,
                inbox: Mutex::new(Some(inbox)),
                closed,
                terminate,
            }
        })
    }

    /// Establishes this end and starts delivering inbound objects.
    ///
    /// Starting an end whose pair was already disconnected raises
    /// `connect_fatal` with an `Initialize` error instead.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let inbox = self.inbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some((inbox, terminate)) = inbox else {
            return Err(Error::contract("connection has already been started"));
        };

        if self.closed.load(Ordering::SeqCst) {
            self.emitter.failed(Error::initialize("connection closed before start")).await?;
            return Err(Error::initialize("connection closed before start"));
        }

        self.emitter.connected().await?;

        let cloned = self.clone();
        tokio::spawn(async move {
            cloned.run(inbox, terminate).await;
        });
        Ok(())
    }

    /// Hands `object` to the peer and reports `send_done` for `tag`.
    pub async fn send(&self, object: P, tag: Tag) -> Result<()> {
        let mut terminate = self.terminate.subscribe();
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::closed("connection is disconnected"));
        }

        self.emitter.begin_send(tag)?;
        select! {
            result = self.outbound.send((object, tag)) => result?,
            _ = terminate.recv() => {
                return Err(Error::closed("connection was disconnected during send"));
            }
        }

        self.complete_send(tag).await
    }

    /// Once the peer holds the object, a rejected completion can only mean
    /// the connection went down in between.
    async fn complete_send(&self, tag: Tag) -> Result<()> {
        self.emitter.sent(tag).await.map_err(|err| match err.kind() {
            ErrorKind::Contract => Error::closed("connection was disconnected during send"),
            _ => err,
        })
    }

    /// Raises `receive_done` on this end as if `object` had arrived.
    pub async fn inject(&self, object: P, tag: Tag) -> Result<()> {
        self.emitter.received(object, tag).await
    }

    /// Raises `connect_fatal` on this end.
    pub async fn fail(&self, err: Error) -> Result<()> {
        self.emitter.failed(err).await
    }

    async fn run(self: Arc<Self>, mut inbox: MpscReceiver<(P, Tag)>, mut terminate: BroadcastReceiver<()>) {
        loop {
            select! {
                biased;
                event = inbox.recv() => {
                    match event {
                        Some((object, tag)) => {
                            if let Err(err) = self.emitter.received(object, tag).await {
                                debug!(connection = %self.id, "stop receiving: {}", err);
                                break;
                            }
                        },
                        None => break,
                    }
                },
                _ = terminate.recv() => break,
            }
        }

        self.closed.store(true, Ordering::SeqCst);
        let _ = self.emitter.disconnected().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Builder;
    use std::time::Duration;
    use tokio::time;

    #[derive(Default)]
    struct Count {
        connected: usize,
        terminated: usize,
        received: Vec<(u32, Tag)>,
        sent: Vec<Tag>,
        failed: Vec<ErrorKind>,
    }

    impl ConnectionDelegate<u32> for Count {
        fn connect_done(&mut self, _connection: Arc<dyn Connection>) {
            self.connected += 1;
        }

        fn connect_terminate(&mut self, _connection: Arc<dyn Connection>) {
            self.terminated += 1;
        }

        fn receive_done(&mut self, _connection: Arc<dyn Connection>, object: u32, tag: Tag) {
            self.received.push((object, tag));
        }

        fn send_done(&mut self, _connection: Arc<dyn Connection>, tag: Tag) {
            self.sent.push(tag);
        }

        fn connect_fatal(&mut self, _connection: Arc<dyn Connection>, err: Error) {
            self.failed.push(err.kind());
        }
    }

    #[tokio::test]
    async fn objects_cross_the_pair_in_order() {
        let mut local = Builder::default().build(Count::default());
        let mut remote = Builder::default().build(Count::default());
        let (a, b) = MemoryConnection::pair(&local, &remote);

        a.start().await.unwrap();
        b.start().await.unwrap();
        assert!(a.is_connected());

        for n in 0..5 {
            a.send(n * 10, n).await.unwrap();
        }

        // connect_done plus five receives
        for _ in 0..6 {
            remote.next().await;
        }
        local.dispatch();

        assert_eq!(remote.delegate().connected, 1);
        assert_eq!(remote.delegate().received, vec![(0, 0), (10, 1), (20, 2), (30, 3), (40, 4)]);
        assert_eq!(local.delegate().sent, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn disconnect_terminates_both_ends_once() {
        let mut local = Builder::default().build(Count::default());
        let mut remote = Builder::default().build(Count::default());
        let (a, b) = MemoryConnection::pair(&local, &remote);

        a.start().await.unwrap();
        b.start().await.unwrap();

        b.disconnect();
        b.disconnect();
        a.disconnect();

        // connect_done then connect_terminate on each side
        local.next().await;
        local.next().await;
        remote.next().await;
        remote.next().await;

        assert_eq!(local.delegate().terminated, 1);
        assert_eq!(remote.delegate().terminated, 1);
        assert!(!a.is_connected());

        let err = a.send(1, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
    }

    #[tokio::test]
    async fn send_before_start_is_rejected() {
        let local = Builder::default().build(Count::default());
        let remote = Builder::default().build(Count::default());
        let (a, _b) = MemoryConnection::pair(&local, &remote);

        let err = a.send(1, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Contract);
    }

    #[tokio::test]
    async fn start_after_disconnect_fails() {
        let mut local = Builder::default().build(Count::default());
        let remote = Builder::default().build(Count::default());
        let (a, b) = MemoryConnection::pair(&local, &remote);

        b.disconnect();
        let err = a.start().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Initialize);

        local.dispatch();
        assert_eq!(local.delegate().failed, vec![ErrorKind::Initialize]);
        assert_eq!(local.delegate().connected, 0);

        let err = a.start().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Contract);
    }

    #[tokio::test]
    async fn fail_reaches_the_delegate() {
        let mut local = Builder::default().build(Count::default());
        let remote = Builder::default().build(Count::default());
        let (a, _b) = MemoryConnection::pair(&local, &remote);

        a.start().await.unwrap();
        a.fail(Error::transport("peer reset")).await.unwrap();

        local.dispatch();
        assert_eq!(local.delegate().connected, 1);
        assert_eq!(local.delegate().failed, vec![ErrorKind::Transport]);
    }

    #[tokio::test]
    async fn blocked_send_fails_on_disconnect() {
        let mut local = Builder::default().build(Count::default());
        let remote = Builder::default().build(Count::default());
        let (a, _b) = MemoryConnection::pair(&local, &remote);
        a.start().await.unwrap();

        // the peer never starts, so its inbox fills up
        for n in 0..(DEFAULT_EVENTS as u32) {
            a.send(n, n).await.unwrap();
        }

        let blocked = a.clone();
        let handle = tokio::spawn(async move {
            blocked.send(99, 99).await
        });
        tokio::task::yield_now().await;
        a.disconnect();

        let result = time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("send still blocked after disconnect")
            .unwrap();
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Closed);

        while local.delegate().terminated == 0 {
            local.next().await;
        }
        local.dispatch();
        assert_eq!(local.delegate().sent.len(), DEFAULT_EVENTS);
        assert!(!local.delegate().sent.contains(&99));
    }

    #[tokio::test]
    async fn completion_after_disconnect_is_closed() {
        let local = Builder::default().build(Count::default());
        let remote = Builder::default().build(Count::default());
        let (a, _b) = MemoryConnection::pair(&local, &remote);
        a.start().await.unwrap();

        a.emitter.begin_send(5).unwrap();
        a.emitter.disconnected().await.unwrap();

        let err = a.complete_send(5).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Closed);
    }
}

use crate::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::fmt::Display;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

/// Correlates a send with its completion or groups related receives.
pub type Tag = u32;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The subject of every delegate notification.
///
/// Observers only ever see a connection through `Arc<dyn Connection>`; they
/// never create or destroy one.
pub trait Connection: Send + Sync + Debug + Display + 'static {
    fn id(&self) -> ConnectionId;
    fn is_connected(&self) -> bool;

    /// Closes the connection. `connect_terminate` follows at most once, no
    /// matter how often this is called; sends still in flight fail with
    /// `ErrorKind::Closed`.
    fn disconnect(&self);
}

/// A connection that accepts tagged outbound objects.
///
/// Completion of `send` is reported through `ConnectionDelegate::send_done`
/// with the same tag.
#[async_trait]
pub trait AsyncConnection<P>: Connection
where
    P: Send + 'static,
{
    async fn send(&self, object: P, tag: Tag) -> Result<()>;
}

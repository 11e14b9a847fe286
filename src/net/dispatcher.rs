use crate::Builder;
use crate::Emitter;
use crate::Message;
use crate::Connection;
use crate::ConnectionDelegate;
use tokio::sync::mpsc;
use tokio::sync::mpsc::Sender as MpscSender;
use tokio::sync::mpsc::Receiver as MpscReceiver;
use tracing::debug;
use std::fmt::Debug;
use std::sync::Weak;

/// Delivery side of the event queue.
///
/// Whoever owns the dispatcher is the callback context: events reach the
/// delegate only from `dispatch` or `next`, one at a time, in the order the
/// emitters queued them.
pub struct Dispatcher<P, D> {
    dispatches: usize,
    mtx: MpscSender<Message<P>>,
    mrx: MpscReceiver<Message<P>>,
    delegate: D,
}

impl<P, D> Debug for Dispatcher<P, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Dispatcher: {{ dispatches:{}, queued:{} }}",
            self.dispatches,
            self.mrx.len()
        )
    }
}

impl<P, D> Dispatcher<P, D>
where
    P: Send + 'static,
    D: ConnectionDelegate<P>,
{
    pub(crate) fn new(builder: Builder, delegate: D) -> Self {
        let (mtx, mrx) = mpsc::channel(builder.messages);
        Self {
            dispatches: builder.dispatches,
            mtx,
            mrx,
            delegate,
        }
    }

    /// Creates the emitter a connection uses to raise its events.
    pub fn emitter(&self, connection: Weak<dyn Connection>) -> Emitter<P> {
        Emitter::new(connection, self.mtx.clone())
    }

    /// Delivers queued events without blocking.
    ///
    /// Returns `true` if the per-call budget ran out, meaning more events
    /// may be waiting.
    pub fn dispatch(&mut self) -> bool {
        for _ in 0..self.dispatches {
            match self.mrx.try_recv() {
                Ok(message) => self.deliver(message),
                _ => return false,
            }
        }
        true
    }

    /// Waits for the next event and delivers it.
    pub async fn next(&mut self) {
        if let Some(message) = self.mrx.recv().await {
            self.deliver(message);
        }
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }

    pub fn into_delegate(self) -> D {
        self.delegate
    }

    fn deliver(&mut self, message: Message<P>) {
        debug!(?message, "dispatch");
        message.deliver(&mut self.delegate);
    }
}

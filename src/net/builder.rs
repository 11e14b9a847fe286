use crate::Dispatcher;
use crate::ConnectionDelegate;

const DEFAULT_MESSAGE_LIMIT: usize = 512;
const DEFAULT_DISPATCH_LIMIT: usize = 16;

#[derive(Debug, Clone)]
pub struct Builder {
    pub(crate) messages: usize,
    pub(crate) dispatches: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            messages: DEFAULT_MESSAGE_LIMIT,
            dispatches: DEFAULT_DISPATCH_LIMIT,
        }
    }
}

impl Builder {
    /// Capacity of the event queue shared by every emitter.
    pub fn messages(mut self, n: usize) -> Self {
        self.messages = n.max(1);
        self
    }

    /// Upper bound on events delivered by a single `Dispatcher::dispatch`.
    pub fn dispatches(mut self, n: usize) -> Self {
        self.dispatches = n.max(1);
        self
    }

    pub fn build<P, D>(self, delegate: D) -> Dispatcher<P, D>
    where
        P: Send + 'static,
        D: ConnectionDelegate<P>,
    {
        Dispatcher::new(self, delegate)
    }
}

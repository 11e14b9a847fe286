use crate::Error;
use crate::Tag;
use crate::Connection;
use std::sync::Arc;

/// Observer of the events an asynchronous connection raises.
///
/// Every method is optional: the default bodies do nothing, so an observer
/// implements only the events it cares about. In particular a delegate that
/// leaves out `connect_fatal` never hears about failures.
///
/// Events for one connection arrive in this order:
/// - `connect_done` at most once, before any `receive_done` or `send_done`
/// - `receive_done` in arrival order, `send_done` only for tags that were sent
/// - `connect_terminate` at most once, after which no receive or send follows
///
/// `connect_fatal` may arrive at any point, before or after
/// `connect_terminate`. Handlers run on the thread that drives the
/// `Dispatcher` and should return promptly.
pub trait ConnectionDelegate<P> {
    /// The connection to the target host has been established.
    fn connect_done(&mut self, _connection: Arc<dyn Connection>) {}

    /// The connection to the target host was lost or closed.
    fn connect_terminate(&mut self, _connection: Arc<dyn Connection>) {}

    /// An object arrived; `tag` identifies the transaction it belongs to.
    fn receive_done(&mut self, _connection: Arc<dyn Connection>, _object: P, _tag: Tag) {}

    /// The object sent with `tag` has left the local write buffer.
    fn send_done(&mut self, _connection: Arc<dyn Connection>, _tag: Tag) {}

    /// The connection failed to initialize or hit an unrecoverable error.
    fn connect_fatal(&mut self, _connection: Arc<dyn Connection>, _err: Error) {}
}

impl<P, D> ConnectionDelegate<P> for Box<D>
where
    D: ConnectionDelegate<P> + ?Sized,
{
    fn connect_done(&mut self, connection: Arc<dyn Connection>) {
        (**self).connect_done(connection)
    }

    fn connect_terminate(&mut self, connection: Arc<dyn Connection>) {
        (**self).connect_terminate(connection)
    }

    fn receive_done(&mut self, connection: Arc<dyn Connection>, object: P, tag: Tag) {
        (**self).receive_done(connection, object, tag)
    }

    fn send_done(&mut self, connection: Arc<dyn Connection>, tag: Tag) {
        (**self).send_done(connection, tag)
    }

    fn connect_fatal(&mut self, connection: Arc<dyn Connection>, err: Error) {
        (**self).connect_fatal(connection, err)
    }
}

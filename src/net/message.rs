use crate::Error;
use crate::Tag;
use crate::Connection;
use crate::ConnectionDelegate;
use std::fmt::Debug;
use std::sync::Arc;

pub enum Message<P> {
    ConnectDone(Arc<dyn Connection>),
    ConnectTerminate(Arc<dyn Connection>),
    ReceiveDone(Arc<dyn Connection>, P, Tag),
    SendDone(Arc<dyn Connection>, Tag),
    ConnectFatal(Arc<dyn Connection>, Error),
}

impl<P> Message<P> {
    pub fn connection(&self) -> &Arc<dyn Connection> {
        match self {
            Message::ConnectDone(connection) => connection,
            Message::ConnectTerminate(connection) => connection,
            Message::ReceiveDone(connection, _, _) => connection,
            Message::SendDone(connection, _) => connection,
            Message::ConnectFatal(connection, _) => connection,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Message::ConnectDone(_) => "connect_done",
            Message::ConnectTerminate(_) => "connect_terminate",
            Message::ReceiveDone(..) => "receive_done",
            Message::SendDone(..) => "send_done",
            Message::ConnectFatal(..) => "connect_fatal",
        }
    }

    pub fn deliver<D>(self, delegate: &mut D)
    where
        D: ConnectionDelegate<P> + ?Sized,
    {
        match self {
            Message::ConnectDone(connection) => {
                delegate.connect_done(connection);
            },
            Message::ConnectTerminate(connection) => {
                delegate.connect_terminate(connection);
            },
            Message::ReceiveDone(connection, object, tag) => {
                delegate.receive_done(connection, object, tag);
            },
            Message::SendDone(connection, tag) => {
                delegate.send_done(connection, tag);
            },
            Message::ConnectFatal(connection, err) => {
                delegate.connect_fatal(connection, err);
            }
        }
    }
}

impl<P> Debug for Message<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::ReceiveDone(connection, _, tag) | Message::SendDone(connection, tag) => {
                write!(f, "Message: {{ {}, connection:{}, tag:{} }}", self.name(), connection.id(), tag)
            },
            _ => write!(f, "Message: {{ {}, connection:{} }}", self.name(), self.connection().id()),
        }
    }
}

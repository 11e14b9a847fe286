#![allow(dead_code)]

use async_network::Connection;
use async_network::ConnectionDelegate;
use async_network::ConnectionId;
use async_network::Error;
use async_network::ErrorKind;
use async_network::Tag;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Event<P> {
    Connected(ConnectionId),
    Disconnected(ConnectionId),
    Received(ConnectionId, P, Tag),
    Sent(ConnectionId, Tag),
    Failed(ConnectionId, ErrorKind, String),
}

#[derive(Debug, Default)]
pub struct Recorder<P> {
    pub events: Vec<Event<P>>,
}

impl<P> ConnectionDelegate<P> for Recorder<P> {
    fn connect_done(&mut self, connection: Arc<dyn Connection>) {
        self.events.push(Event::Connected(connection.id()));
    }

    fn connect_terminate(&mut self, connection: Arc<dyn Connection>) {
        self.events.push(Event::Disconnected(connection.id()));
    }

    fn receive_done(&mut self, connection: Arc<dyn Connection>, object: P, tag: Tag) {
        self.events.push(Event::Received(connection.id(), object, tag));
    }

    fn send_done(&mut self, connection: Arc<dyn Connection>, tag: Tag) {
        self.events.push(Event::Sent(connection.id(), tag));
    }

    fn connect_fatal(&mut self, connection: Arc<dyn Connection>, err: Error) {
        self.events.push(Event::Failed(connection.id(), err.kind(), err.message().to_string()));
    }
}

/// A connection with no behavior of its own; events are raised by hand.
#[derive(Debug)]
pub struct Stub {
    id: ConnectionId,
}

impl Stub {
    pub fn new() -> Arc<dyn Connection> {
        Arc::new(Self { id: ConnectionId::next() })
    }
}

impl Display for Stub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stub {}", self.id)
    }
}

impl Connection for Stub {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_connected(&self) -> bool {
        false
    }

    fn disconnect(&self) {
    }
}

/// Checks the ordering guarantees an observer relies on, per connection.
pub fn assert_contract<P>(events: &[Event<P>], sends: &HashMap<ConnectionId, Vec<Tag>>) {
    let mut connected: HashMap<ConnectionId, bool> = HashMap::new();
    let mut terminated: HashMap<ConnectionId, bool> = HashMap::new();
    let mut outstanding = sends.clone();

    for event in events {
        match event {
            Event::Connected(id) => {
                assert!(!connected.get(id).copied().unwrap_or(false), "connected twice: {}", id);
                assert!(!terminated.get(id).copied().unwrap_or(false), "connected after terminate: {}", id);
                connected.insert(*id, true);
            },
            Event::Disconnected(id) => {
                assert!(!terminated.get(id).copied().unwrap_or(false), "terminated twice: {}", id);
                terminated.insert(*id, true);
            },
            Event::Received(id, _, _) => {
                assert!(connected.get(id).copied().unwrap_or(false), "receive before connect: {}", id);
                assert!(!terminated.get(id).copied().unwrap_or(false), "receive after terminate: {}", id);
            },
            Event::Sent(id, tag) => {
                assert!(connected.get(id).copied().unwrap_or(false), "sent before connect: {}", id);
                assert!(!terminated.get(id).copied().unwrap_or(false), "sent after terminate: {}", id);
                let tags = outstanding.get_mut(id).expect("sent without any send request");
                let position = tags.iter().position(|t| t == tag).expect("sent with unknown tag");
                tags.remove(position);
            },
            Event::Failed(..) => (),
        }
    }
}

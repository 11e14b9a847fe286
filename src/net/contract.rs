use crate::Error;
use crate::Result;
use crate::Tag;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Connecting,
    Connected,
    Disconnected,
}

/// One event as seen by the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Connect,
    Disconnect,
    Receive,
    BeginSend(Tag),
    FinishSend(Tag),
    Fail,
}

#[derive(Debug)]
struct Inner {
    state: State,
    pending: HashMap<Tag, usize>,
}

impl Inner {
    fn apply(&mut self, transition: Transition) -> Result<()> {
        match transition {
            Transition::Connect => {
                if State::Connecting != self.state {
                    return Err(Error::contract(format!("connect raised in state {:?}", self.state)));
                }
                self.state = State::Connected;
            },
            Transition::Disconnect => {
                if State::Disconnected == self.state {
                    return Err(Error::contract("disconnect raised twice"));
                }
                self.state = State::Disconnected;
                self.pending.clear();
            },
            Transition::Receive => self.require_connected("receive")?,
            Transition::BeginSend(tag) => {
                self.require_connected("send")?;
                *self.pending.entry(tag).or_insert(0) += 1;
            },
            Transition::FinishSend(tag) => {
                self.require_connected("send completion")?;
                match self.pending.get_mut(&tag) {
                    Some(count) if *count > 1 => *count -= 1,
                    Some(_) => {
                        self.pending.remove(&tag);
                    },
                    None => return Err(Error::contract(format!("no send is outstanding for tag {}", tag))),
                }
            },
            // failures may be raised in any state
            Transition::Fail => (),
        }

        Ok(())
    }

    fn require_connected(&self, event: &str) -> Result<()> {
        match self.state {
            State::Connected => Ok(()),
            state => Err(Error::contract(format!("{} raised in state {:?}", event, state))),
        }
    }
}

/// Ordering guard for the events raised on behalf of one connection.
///
/// Every check that fails leaves the guard untouched and yields an
/// `ErrorKind::Contract` error, so the offending event is never queued.
/// `apply_then` runs the follow-up under the same lock as the check; the
/// emitter queues through it so that the queue order matches the order the
/// guard admitted events in.
#[derive(Debug)]
pub struct Contract {
    inner: Mutex<Inner>,
}

impl Default for Contract {
    fn default() -> Self {
        Self::new()
    }
}

impl Contract {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: State::Connecting,
                pending: HashMap::new(),
            }),
        }
    }

    pub fn state(&self) -> State {
        self.lock().state
    }

    pub fn apply(&self, transition: Transition) -> Result<()> {
        self.lock().apply(transition)
    }

    /// Applies `transition` and, only if it is admitted, runs `then` before
    /// any other transition can be applied.
    pub fn apply_then<T, F>(&self, transition: Transition, then: F) -> Result<T>
    where
        F: FnOnce() -> T,
    {
        let mut inner = self.lock();
        inner.apply(transition)?;
        Ok(then())
    }

    pub fn connect(&self) -> Result<()> {
        self.apply(Transition::Connect)
    }

    pub fn disconnect(&self) -> Result<()> {
        self.apply(Transition::Disconnect)
    }

    pub fn receive(&self) -> Result<()> {
        self.apply(Transition::Receive)
    }

    pub fn begin_send(&self, tag: Tag) -> Result<()> {
        self.apply(Transition::BeginSend(tag))
    }

    pub fn finish_send(&self, tag: Tag) -> Result<()> {
        self.apply(Transition::FinishSend(tag))
    }

    pub fn fail(&self) -> Result<()> {
        self.apply(Transition::Fail)
    }

    pub fn outstanding(&self, tag: Tag) -> usize {
        self.lock().pending.get(&tag).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

use crate::Error;
use crate::Result;
use crate::Tag;
use crate::Message;
use crate::Connection;
use crate::Contract;
use crate::State;
use crate::Transition;
use tokio::sync::mpsc::Sender as MpscSender;
use tracing::trace;
use tracing::warn;
use std::sync::Arc;
use std::sync::Weak;

/// Raising side of the event queue, bound to one connection.
///
/// Each raise is checked against the connection's `Contract` before it is
/// queued. Raising awaits queue capacity, so a connection that raises events
/// from the same task that drives the `Dispatcher` must keep dispatching.
pub struct Emitter<P> {
    connection: Weak<dyn Connection>,
    contract: Arc<Contract>,
    message: MpscSender<Message<P>>,
}

impl<P> Clone for Emitter<P> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            contract: self.contract.clone(),
            message: self.message.clone(),
        }
    }
}

impl<P> Emitter<P> {
    pub(crate) fn new(connection: Weak<dyn Connection>, message: MpscSender<Message<P>>) -> Self {
        Self { connection, contract: Arc::new(Contract::new()), message }
    }

    pub fn connection(&self) -> Option<Arc<dyn Connection>> {
        self.connection.upgrade()
    }

    pub fn state(&self) -> State {
        self.contract.state()
    }

    pub async fn connected(&self) -> Result<()> {
        let connection = self.upgrade()?;
        let message = Message::ConnectDone(connection.clone());
        self.raise(&connection, Transition::Connect, message).await
    }

    pub async fn disconnected(&self) -> Result<()> {
        let connection = self.upgrade()?;
        let message = Message::ConnectTerminate(connection.clone());
        self.raise(&connection, Transition::Disconnect, message).await
    }

    pub async fn received(&self, object: P, tag: Tag) -> Result<()> {
        let connection = self.upgrade()?;
        let message = Message::ReceiveDone(connection.clone(), object, tag);
        self.raise(&connection, Transition::Receive, message).await
    }

    /// Records `tag` as outstanding; nothing is delivered until `sent`.
    pub fn begin_send(&self, tag: Tag) -> Result<()> {
        let connection = self.upgrade()?;
        self.check(&connection, self.contract.apply(Transition::BeginSend(tag)))
    }

    pub async fn sent(&self, tag: Tag) -> Result<()> {
        let connection = self.upgrade()?;
        let message = Message::SendDone(connection.clone(), tag);
        self.raise(&connection, Transition::FinishSend(tag), message).await
    }

    pub async fn failed(&self, err: Error) -> Result<()> {
        let connection = self.upgrade()?;
        let message = Message::ConnectFatal(connection.clone(), err);
        self.raise(&connection, Transition::Fail, message).await
    }

    fn upgrade(&self) -> Result<Arc<dyn Connection>> {
        self.connection
            .upgrade()
            .ok_or_else(|| Error::closed("connection has been dropped"))
    }

    fn check(&self, connection: &Arc<dyn Connection>, result: Result<()>) -> Result<()> {
        if let Err(err) = &result {
            warn!(connection = %connection.id(), "rejected event: {}", err);
        }
        result
    }

    /// Queue space is reserved first; the check and the enqueue then happen
    /// under the contract lock, so no other raise can slip in between.
    async fn raise(&self, connection: &Arc<dyn Connection>, transition: Transition,
        message: Message<P>) -> Result<()> {
        let permit = self.message.reserve().await?;
        trace!(?message, "raise");
        let result = self.contract.apply_then(transition, move || permit.send(message));
        self.check(connection, result)
    }
}

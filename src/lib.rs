pub mod net;
pub use net::error::Error;
pub use net::error::ErrorKind;
pub use net::error::Result;
pub use net::connection::Tag;
pub use net::connection::ConnectionId;
pub use net::connection::Connection;
pub use net::connection::AsyncConnection;
pub use net::delegate::ConnectionDelegate;
pub use net::message::Message;
pub use net::contract::Contract;
pub use net::contract::State;
pub use net::contract::Transition;
pub use net::emitter::Emitter;
pub use net::builder::Builder;
pub use net::dispatcher::Dispatcher;
pub use net::memory::MemoryConnection;

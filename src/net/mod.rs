pub mod error;
pub mod connection;
pub mod delegate;
pub mod message;
pub mod contract;
pub mod emitter;
pub mod builder;
pub mod dispatcher;
pub mod memory;

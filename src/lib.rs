//! graydb - a versioned, self-hostable configuration store with
//! gray-release routing
//!
//! Namespaced configuration keys carry a draft and a published version;
//! publishing promotes the draft, and gray rules route a deterministic
//! percentage of clients to the draft while it rolls out.

pub mod cli;
pub mod gray;
pub mod http_server;
pub mod notify;
pub mod observability;
pub mod publish;
pub mod service;
pub mod snapshot;
pub mod store;

//! Talking to the calendar service: wire types, transport, and the
//! retrying sync client.

pub mod client;
pub mod protocol;
pub mod transport;

pub use client::{SyncClient, SyncFeed};
pub use transport::{CredentialsProvider, HttpTransport, Login, SessionId, Transport};

//! Remote endpoints.
//!
//! Both endpoints are optional collaborators: the bundled default document
//! is fetched only when nothing local exists, and the save mirror only ever
//! follows a successful local save. Failures here are never fatal to callers.

pub mod fetch;
pub mod response;

pub use fetch::RemoteClient;
pub use response::{Response, SaveAck};

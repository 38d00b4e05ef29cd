//! Auth-domain identifiers, credential pairs, and the consumer/token/resource records.

pub mod consumer;
pub mod credentials;
pub mod id;
pub mod resource;
pub mod secret;
pub mod token;

pub use consumer::*;
pub use credentials::*;
pub use id::*;
pub use resource::*;
pub use secret::*;
pub use token::*;

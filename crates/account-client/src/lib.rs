//! Account client capability.
//!
//! Login primitives for one phone-based messaging account: connect to the
//! account network, request a one-time code, complete sign-in with the code
//! or a two-factor password. The live implementation drives an MTProto
//! gateway over REST; tests use the scripted [`MockConnector`].

mod error;
mod gateway;
mod mock;
mod types;

pub use error::AccountError;
pub use gateway::{GatewayClient, GatewaySession};
pub use mock::{MockCall, MockConnector};
pub use types::*;

//! Device identity ownership and persistence.

mod error;
mod id;
mod manager;

pub use error::IdentityError;
pub use id::{DeviceIdentifier, ID_LEN};
pub use manager::{IdentityManager, IdentityState};

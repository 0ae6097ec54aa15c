//! Bearer-token access: the redacted secret wrapper and the store-backed accessor.

pub mod accessor;
pub mod secret;

pub use accessor::*;
pub use secret::*;

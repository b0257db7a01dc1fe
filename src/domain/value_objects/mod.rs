//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Nickname**: Non-empty display name chosen by a simulated client
//! - **SessionTiming**: Leave/disconnect delays and message period bounds
//! - **PayloadBounds**: Sizes of generated nicknames and message texts

mod nickname;
mod timing;

pub use nickname::*;
pub use timing::*;

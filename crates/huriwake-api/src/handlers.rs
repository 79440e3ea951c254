//! Request handlers.

pub mod health;
pub mod review;
pub mod screenshots;
pub mod videos;

pub use health::*;
pub use review::*;
pub use screenshots::*;
pub use videos::*;

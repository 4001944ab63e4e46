// Application layer - use cases and orchestration on top of the stores.

pub mod error;
mod locks;
mod retry;
mod service;

pub use error::*;
pub use locks::*;
pub use retry::*;
pub use service::*;

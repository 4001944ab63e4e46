mod accounts;
mod entries;
mod error;

pub use accounts::*;
pub use entries::*;
pub use error::*;

mod account;
mod clock;
mod entry;
mod id;
mod ledger;
mod money;

pub use account::*;
pub use clock::*;
pub use entry::*;
pub use id::*;
pub use ledger::*;
pub use money::*;

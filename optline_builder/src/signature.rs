mod core;
mod grammar;
mod slot;

pub use self::core::*;
pub use slot::*;

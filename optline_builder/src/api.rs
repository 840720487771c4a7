mod command;
mod core;
mod kind;
mod option;
mod parameter;

pub use self::core::*;
pub use command::*;
pub use kind::*;
pub use option::*;
pub use parameter::*;

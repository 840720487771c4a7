//! Builder module for `optline`.
//! See [documentation root](https://docs.rs/optline/latest/optline/index.html) for full details.
#![deny(missing_docs)]
mod api;
mod constant;
mod matcher;
mod model;
mod parser;
#[allow(missing_docs)]
pub mod prelude;
mod signature;

pub use api::*;
pub use model::*;
pub use parser::{ConfigError, GeneralParser, ParseError};
pub use signature::*;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

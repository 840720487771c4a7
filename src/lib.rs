//! `optline` is a command line parser for Rust.
//!
//! Programs declare *switches*, *flags*, *bools* and *commands*, and `optline` matches an argument vector against them.
//! The result is the state written by each declaration, along with the leftover arguments nothing claimed.
//! `optline` prioritizes the following design concerns:
//! * *Declarative options*:
//! Each option states its argument grammar once (ex: `<width> [<height>]`), and the parser decides how many tokens it takes.
//! * *Validated arguments*:
//! Argument types, patterns, allowed sets and constraints are checked while matching, so an option never collects a token it cannot use.
//! * *Leftovers over errors*:
//! A token which matches nothing is kept as a leftover argument, unless the parser is `strict`.
//! * *Commands*:
//! A program may declare commands, each with its own options and arguments.
//! At most one command runs per parse.
//!
//! # Usage
//! ```no_run
#![doc = include_str!("../demos/summer.rs")]
//! ```
//!
//! ```console
//! $ summer -h
//! usage: summer [-h] [-i <item>...]
//!
//! Sum the items.
//!
//! options:
//!  -h, --help              Show this help message and exit.
//!  -i, --items <item>...   The items to sum.
//!
//! $ summer -i 1 2 3
//! Sum: 6
//!
//! $ summer -i blah
//! Parse error: missing or invalid argument(s) for 'items' (given [], expected '<item>...').
//! -i blah
//! ^
//! ```
//!
//! # Options
//! Start with a [`CommandLineParser`] and `add` options.
//! There are three classes of option:
//! * [`Opt::switch`]: takes no arguments, and writes `true` when present (ex: `--verbose`).
//! * [`Opt::flag`]: takes arguments per its grammar (ex: `--size 3 4`).
//! Without a grammar, a flag takes exactly one argument.
//! * [`Opt::boolean`]: a switch which also has a negated form, writing `false` (ex: `--no-colour`).
//!
//! A multi-character option name doubles as the long name, with dashes and underscores interchangeable (`--dry-run` and `--dry_run`).
//! A single character name doubles as the short name.
//! Short switches may be clustered (ex: `-vx`), as long as only the final option of the cluster takes arguments (ex: `-vxs 2.45`).
//! Any option may also take its value inline (ex: `--size=3`, `-s=3`), in which case it takes no further tokens.
//!
//! # Arguments
//! The argument grammar is a space separated list of slots:
//! * `<name>`: a mandatory slot.
//! * `[<name>]`: an optional slot, filled only when there are tokens to spare.
//! * `<name>...`: a final slot which takes every remaining (acceptable) token.
//!
//! Slots are restricted via the [`Declare`](./prelude/trait.Declare.html) keys: `kind`, `matching`, `within`, `default` and `constraint`.
//! The singular form of a key applies to every slot, while the plural form (ex: `kinds`) applies positionally.
//! Alternatively, [`Declare::range`](./prelude/trait.Declare.html#method.range) and [`Declare::choices`](./prelude/trait.Declare.html#method.choices) declare a single restricted slot.
//!
//! An option writes a single value when it has one slot (or none), otherwise a [`Value::List`] with one value per slot.
//! Unfilled optional slots take their default, or [`Value::Null`].
//!
//! # Commands
//! A [`Command`] is invoked by a bare word.
//! Its own options are declared in a block which only runs once the command is invoked.
//! The command writes a nested [`State`] under its name, holding its options and (under `args`) its arguments.
//!
//! ```no_run
#![doc = include_str!("../demos/packager.rs")]
//! ```
//!
//! # Callbacks
//! Any option or command may be given a `callback`.
//! The callback receives the named [`Arguments`], and replaces the write into the state.
//!
//! # Features
//! * `tracing_debug`: Emit `tracing` debug events while matching.
//! * `unit_test`: For features that help with unit testing.
pub use optline_builder::*;

//! Library half of the `mutatio` binary: argument definitions, document I/O
//! and the command implementations.

pub mod cli;
pub mod commands;
pub mod io;
pub mod parallel;

//! Kernel smart account command line client

pub mod account;
pub mod cli;
pub mod utils;

//! Use cases

pub mod process_inbox;

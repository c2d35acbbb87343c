//! Interface layer

pub mod cli;
pub mod composition;

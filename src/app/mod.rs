//! Application module

pub mod cli;
pub mod devices;
pub mod presenter;
pub mod startup;

pub(crate) mod bootstrap;
mod config;
mod gameplay;
pub(crate) mod loop_runner;

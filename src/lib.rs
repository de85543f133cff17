pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod plans;
pub mod remote;
pub mod session;
pub mod state;
pub mod water;

#[cfg(test)]
mod test_utils;

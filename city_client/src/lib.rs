//! Client for the city builder automation server.
//!
//! The engine listens on a plain TCP port and answers one JSON object per
//! connection. This crate wraps that exchange with retry
//! ([`transport::send_command`]), a typed client that prints summaries of
//! each reply ([`client::CityClient`]), scripted demo scenarios and an
//! interactive prompt.

pub mod client;
pub mod config;
pub mod report;
pub mod repl;
pub mod scenarios;
pub mod transport;

#[cfg(test)]
mod testing;

pub use client::CityClient;
pub use config::{load_client_config_from_env, ClientConfig, ConfigError};
pub use repl::{run_repl, SessionEnd};
pub use scenarios::{MenuChoice, Pacer, Scenario, DEFAULT_RANDOM_BUILDINGS};
pub use transport::{send_command, RetryPolicy, TcpTransport, Transport, TransportError};

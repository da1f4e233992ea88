//! # smsweather - SMS weather responder for AT-command modems
//!
//! Polls a cellular modem for unread text messages, answers coordinate
//! requests (`-43.53,172.63`) with a three-day forecast and everything else
//! with usage help, then deletes the handled message.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "serial")]
//! # {
//! use smsweather::config::Config;
//! use smsweather::modem::Modem;
//! use smsweather::responder::Responder;
//! use smsweather::weather::MeteoblueService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let modem = Modem::open_serial(
//!         &config.modem.port,
//!         config.modem.baud_rate,
//!         config.modem.timeout(),
//!         config.timing.clone(),
//!     )?;
//!     let mut responder = Responder::new(modem, MeteoblueService::new(config.weather.clone()));
//!     responder.run().await;
//!     Ok(())
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`modem`] - serial transport, AT commands, listing parser, send/delete sequencing
//! - [`reply`] - decides between a forecast and the help text
//! - [`weather`] - meteoblue client and forecast rendering
//! - [`responder`] - the poll loop
//! - [`config`] - TOML configuration
//! - [`validation`] - checks on values spliced into AT commands
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   Responder     │ ← poll, dispatch, pace
//! └─────────────────┘
//!     │          │
//! ┌────────┐ ┌─────────┐
//! │ Reply  │ │ Weather │ ← decide / fetch + render
//! └────────┘ └─────────┘
//!          │
//! ┌─────────────────┐
//! │   Modem         │ ← AT commands over serial
//! └─────────────────┘
//! ```

pub mod config;
pub mod logutil;
pub mod metrics;
pub mod modem;
pub mod reply;
pub mod responder;
pub mod validation;
pub mod weather;

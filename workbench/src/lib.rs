#![doc = include_str!("../README.md")]
#![deny(missing_docs)]

pub mod client;
/// Shared domain types and the error taxonomy
pub mod common;
pub mod config;
pub mod controller;
pub mod descriptor;
pub mod export;
pub mod gate;
pub mod logging;
pub mod params;
pub mod render;
pub mod session;

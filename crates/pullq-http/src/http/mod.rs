//! HTTP surface for pullq
//!
//! This module contains all HTTP-specific functionality including:
//! - Request/response types and validation for the REST API
//! - The axum broker server exposing a [`pullq::Broker`]
//! - The reqwest client binding and its CLI

pub mod broker;
pub mod cli;
pub mod client;
pub mod common;
pub mod error;

pub use client::{ClientConfig, PullqClient};
pub use common::*;

//! Ignite UXO HTTP API.
//!
//! Serves the UXO list, record details and document generation under
//! `/recons/uxo/uxo`, backed by the data and document services behind the
//! [`services`] traits.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

//! Electro World backend library.
//!
//! This crate provides the shop backend as a library, allowing the
//! routes and services to be tested without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

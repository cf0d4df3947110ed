//! Loanbook Backend Library
//!
//! Back-office service for a small lender: clients, loans, and payments,
//! with role-based visibility and automatic settlement of paid-off loans.

pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod loan;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod routes;
pub mod scope;
pub mod state;
pub mod store;

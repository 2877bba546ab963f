pub mod auth;
pub mod config;
pub mod datastore;
pub mod error;
pub mod filter;
pub mod forms;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod observability;
pub mod panicker;
pub mod services;
pub mod templates;
pub mod types;

#[cfg(test)]
pub mod testing;

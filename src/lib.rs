//! Generate PostgreSQL initialization files from per-service configs.
//!
//! Scans the subdirectories of a root for `config.yaml` and `.env` files and
//! writes `postgres/init.sql` and `postgres/.env` for the database container.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;

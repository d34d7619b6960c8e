//! # forkful-store
//!
//! Relational storage for Forkful, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for restaurants,
//! their images and user profiles. Label lists are written as whole JSON
//! arrays; there is no append primitive.

pub mod database;
pub mod images;
pub mod migrations;
pub mod restaurants;
pub mod users;

mod error;
mod rows;

pub use database::Database;
pub use error::{Result, StoreError};
pub use restaurants::LabelSuggestions;

//! # forkful-shared
//!
//! Domain types and the pure, I/O-free pieces of Forkful:
//!
//! - [`filter`] derives a search view over a loaded restaurant collection
//! - [`labels`] holds the tag/dish list and the pending-input editor
//! - [`form`] validates the add-restaurant form into a [`NewRestaurant`]

pub mod constants;
pub mod error;
pub mod filter;
pub mod form;
pub mod labels;
pub mod models;
pub mod types;

pub use error::ValidationError;
pub use filter::{filter, filter_with, SearchFields, SearchQuery, Searchable};
pub use form::RestaurantForm;
pub use labels::{suggestions, Key, LabelEditor, LabelList};
pub use models::*;
pub use types::UserId;

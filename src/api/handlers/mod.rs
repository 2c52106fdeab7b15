//! HTTP request handlers, one module per resource.

pub mod auth;
pub mod health;
pub mod listings;
pub mod purchases;
pub mod users;
pub mod wishlist;

//! HTTP surface: axum router, handlers, DTOs and middleware, all under `/api`.

mod doc;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;

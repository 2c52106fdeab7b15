//! Data Transfer Objects for API requests and responses.
//!
//! The wire format is camelCase JSON; request bodies are validated with
//! `validator` before they reach a service.

mod auth;
mod error;
mod health;
mod listing;
mod purchase;
mod user;

pub use auth::{
    LoginRequest, ResendVerificationRequest, SignupRequest, VerificationPendingResponse,
    VerifyEmailRequest,
};
pub use error::{ErrorResponse, MessageResponse};
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use listing::{
    ContactResponse, CreateListingRequest, ListingQuery, ListingResponse, MarkSoldRequest,
    MarkSoldResponse, PendingPurchaseResponse, UpdateListingRequest,
};
pub use purchase::{ConfirmPurchaseRequest, PurchaseResponse};
pub use user::{
    RateSellerRequest, RatingStatsResponse, UpdateProfileRequest, UserListingsQuery,
    UserProfileResponse, UserSearchQuery, UserSummary,
};

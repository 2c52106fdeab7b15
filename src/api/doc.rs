use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

pub const AUTH_TAG: &str = "Auth";
pub const LISTING_TAG: &str = "Listings";
pub const PURCHASE_TAG: &str = "Purchases";
pub const WISHLIST_TAG: &str = "Wishlist";
pub const USER_TAG: &str = "Users";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Campus Bazaar",
        description = "Student marketplace: listings, purchases and seller reputation",
    ),
    modifiers(&SecurityAddon),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
            crate::models::PurchaseStatus,
            crate::models::ListingSort,
        )
    ),
    tags(
        (name = AUTH_TAG, description = "Signup, email verification and sessions"),
        (name = LISTING_TAG, description = "Browse, create and sell listings"),
        (name = PURCHASE_TAG, description = "Confirm or cancel pending purchases"),
        (name = WISHLIST_TAG, description = "Saved listings"),
        (name = USER_TAG, description = "Profiles, directory and seller ratings"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "cb_jwt",
                    "Session cookie set by login, signup and verify-email",
                ))),
            );
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Session token as a Bearer header"))
                        .build(),
                ),
            );
        }
    }
}

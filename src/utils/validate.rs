use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// JSON body extractor that runs `validator` rules before the handler sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// Query string extractor with the same validation step.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Query<T>: FromRequestParts<S, Rejection = QueryRejection>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> AppResult<Self> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        value.validate()?;
        Ok(ValidatedQuery(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct NewListingProbe {
        #[validate(length(min = 2, message = "title must be at least 2 characters"))]
        title: String,
        #[validate(range(min = 0.0, message = "price must be non-negative"))]
        price: f64,
    }

    fn json_request(body: &'static str, content_type: &'static str) -> Request {
        Request::builder()
            .method(Method::POST)
            .uri("/api/listings")
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let req = json_request(r#"{"title":"Desk","price":40.5}"#, "application/json");
        let ValidatedJson(probe) = ValidatedJson::<NewListingProbe>::from_request(req, &())
            .await
            .unwrap();
        assert_eq!(probe.title, "Desk");
        assert_eq!(probe.price, 40.5);
    }

    #[tokio::test]
    async fn test_rule_violations_are_collected() {
        let req = json_request(r#"{"title":"D","price":-1}"#, "application/json");
        match ValidatedJson::<NewListingProbe>::from_request(req, &()).await {
            Err(AppError::ValidationErrors { errors }) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["price", "title"]);
            }
            other => panic!("Expected ValidationErrors, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let req = json_request(r#"{"title":"Desk"}"#, "application/json");
        assert!(matches!(
            ValidatedJson::<NewListingProbe>::from_request(req, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_bad_request() {
        let req = json_request(r#"{"title":"Desk","price":1}"#, "text/plain");
        assert!(matches!(
            ValidatedJson::<NewListingProbe>::from_request(req, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }

    #[derive(Debug, Deserialize, Validate)]
    struct PageProbe {
        #[validate(range(min = 1, max = 100))]
        limit: i64,
    }

    fn query_parts(uri: &str) -> Parts {
        let (parts, _) = Request::builder().uri(uri).body(Body::empty()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_query_is_validated() {
        let mut ok = query_parts("/api/listings?limit=20");
        let ValidatedQuery(probe) = ValidatedQuery::<PageProbe>::from_request_parts(&mut ok, &())
            .await
            .unwrap();
        assert_eq!(probe.limit, 20);

        let mut too_big = query_parts("/api/listings?limit=500");
        assert!(matches!(
            ValidatedQuery::<PageProbe>::from_request_parts(&mut too_big, &()).await,
            Err(AppError::ValidationErrors { .. })
        ));

        let mut garbage = query_parts("/api/listings?limit=abc");
        assert!(matches!(
            ValidatedQuery::<PageProbe>::from_request_parts(&mut garbage, &()).await,
            Err(AppError::BadRequest { .. })
        ));
    }
}

use crate::auth::types::{SendCodeRequest, SessionResponse, VerifyCodeRequest};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(crate::api::handlers::health::health),
    components(schemas(
        SendCodeRequest,
        VerifyCodeRequest,
        SessionResponse,
        crate::api::handlers::health::Health
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "One-time-code login and sessions, served under /api/auth")
    )
)]
struct ApiDoc;

/// The generated `OpenAPI` document served at `/api-docs/openapi.json`.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::openapi;

    #[test]
    fn spec_has_health_path_and_auth_schemas() {
        let spec = openapi();
        assert!(spec.paths.paths.contains_key("/health"));
        let components = spec.components.expect("components");
        assert!(components.schemas.contains_key("SendCodeRequest"));
        assert!(components.schemas.contains_key("VerifyCodeRequest"));
        assert!(components.schemas.contains_key("SessionResponse"));
    }
}

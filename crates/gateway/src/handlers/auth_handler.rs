//! Authentication handlers.

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use auth_service_lib::gate::AuthenticatedContext;
use auth_service_lib::service::AuthSession;
use common::{ApiResponse, AppResult, Created};
use domain::CredentialResponse;

use crate::extractors::ValidatedJson;
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Email and password, used for both registration and login
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    /// Account email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Account password
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "pw1")]
    pub password: String,
}

/// Token and account returned by register and login
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Signed bearer token
    pub token: String,
    /// Always "Bearer"
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub user: CredentialResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            user: session.user,
        }
    }
}

/// Authenticated subject
#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub id: Uuid,
}

/// Create authentication routes
pub fn auth_routes(state: AppState) -> Router<AppState> {
    let signout = Router::new()
        .route("/signout", post(signout))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(signout)
}

/// Protected routes outside the auth rate limit
pub fn account_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(me))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = CredentialsRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Validation error or email already in use"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> AppResult<Created<AuthResponse>> {
    let session = state
        .auth_service
        .signup(payload.email, payload.password)
        .await?;

    Ok(Created(ApiResponse::with_message(
        AuthResponse::from(session),
        "User registered successfully",
    )))
}

/// Log in and get a fresh token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CredentialsRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let session = state
        .auth_service
        .signin(payload.email, payload.password)
        .await?;

    Ok(ApiResponse::with_message(
        AuthResponse::from(session),
        "Login successful",
    ))
}

/// Revoke the token used for this request
#[utoipa::path(
    post,
    path = "/api/auth/signout",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Successfully signed out"),
        (status = 401, description = "Missing or revoked token"),
        (status = 403, description = "Invalid or expired token")
    )
)]
pub async fn signout(
    State(state): State<AppState>,
    Extension(context): Extension<AuthenticatedContext>,
) -> ApiResponse<()> {
    state.auth_service.signout(&context.token);
    tracing::info!(user_id = %context.subject_id, "Signed out");

    ApiResponse::message("Successfully signed out")
}

/// Get the authenticated subject
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated subject", body = MeResponse),
        (status = 401, description = "Missing or revoked token"),
        (status = 403, description = "Invalid or expired token")
    )
)]
pub async fn me(Extension(context): Extension<AuthenticatedContext>) -> ApiResponse<MeResponse> {
    ApiResponse::success(MeResponse {
        id: context.subject_id,
    })
}

//! Account API handlers.
//!
//! ```text
//! POST /api/v1/login {"username":"ada","password":"password"}
//! POST /api/v1/users {"username":"ada","displayName":"Ada"}
//! GET /api/v1/users/me
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{DisplayName, Error, LoginCredentials, LoginValidationError, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::AccountResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_value_error, require};

/// Login request body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl TryFrom<LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.username, &value.password)
    }
}

/// Registration request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "ada")]
    pub username: Option<String>,
    #[schema(example = "Ada")]
    pub display_name: Option<String>,
}

const USERNAME: FieldName = FieldName::new("username");
const DISPLAY_NAME: FieldName = FieldName::new("displayName");

fn map_login_validation_error(err: LoginValidationError) -> Error {
    match err {
        LoginValidationError::EmptyUsername => Error::invalid_request("username must not be empty")
            .with_details(json!({ "field": "username", "code": "empty_username" })),
        LoginValidationError::EmptyPassword => Error::invalid_request("password must not be empty")
            .with_details(json!({ "field": "password", "code": "empty_password" })),
    }
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AccountResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let credentials =
        LoginCredentials::try_from(payload.into_inner()).map_err(map_login_validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    let account = state.account_query.me(&user_id).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

/// Register an account with the starting points balance and log it in.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Username taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        username,
        display_name,
    } = payload.into_inner();
    let username = Username::new(require(username, USERNAME)?)
        .map_err(|err| invalid_value_error(USERNAME, err))?;
    let display_name = DisplayName::new(require(display_name, DISPLAY_NAME)?)
        .map_err(|err| invalid_value_error(DISPLAY_NAME, err))?;

    let account = state.accounts.register(username, display_name).await?;
    session.persist_user(&account.id)?;
    Ok(HttpResponse::Created().json(AccountResponse::from(account)))
}

/// The authenticated account, including its current points balance.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AccountResponse>> {
    let user_id = session.require_user_id()?;
    let account = state.account_query.me(&user_id).await?;
    Ok(web::Json(AccountResponse::from(account)))
}

//! Test helpers for inbound HTTP components.
//!
//! Handler tests run the real services over the in-process store, so the
//! status codes they assert are the ones production returns.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use crate::domain::ports::{ItemRepository, UserAccountRepository};
use crate::domain::{Item, UserAccount};
use crate::inbound::http::api_routes;
use crate::inbound::http::state::HttpState;
use crate::outbound::memory::InMemoryStore;
use crate::test_support::clock::MutableClock;

/// Shared password accepted by the test login service.
pub const TEST_PASSWORD: &str = "password";

/// Build a session middleware configured for tests.
///
/// Generates a fresh key per invocation and disables the `Secure` flag for
/// plain HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// In-process store plus the HTTP state wired over it.
pub struct TestWorld {
    pub store: Arc<InMemoryStore>,
    pub state: HttpState,
}

impl TestWorld {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let state = HttpState::from_repositories(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(MutableClock::default()),
            TEST_PASSWORD,
        );
        Self { store, state }
    }

    pub async fn add_account(&self, account: &UserAccount) {
        UserAccountRepository::insert(self.store.as_ref(), account)
            .await
            .expect("insert account");
    }

    pub async fn add_item(&self, item: &Item) {
        ItemRepository::insert(self.store.as_ref(), item)
            .await
            .expect("insert item");
    }

    /// Actix app with every API route mounted under `/api/v1`.
    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::new(self.state.clone()))
            .wrap(test_session_middleware())
            .service(web::scope("/api/v1").configure(api_routes))
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Log in as `username` and return the session cookie.
pub async fn login_cookie<S>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "username": username, "password": TEST_PASSWORD }))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert!(response.status().is_success(), "login as {username}");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}

/// Read a JSON response body.
pub async fn body_json(response: ServiceResponse) -> Value {
    actix_test::read_body_json(response).await
}

/// `details.code` of an error payload.
pub fn detail_code(body: &Value) -> Option<&str> {
    body.get("details")
        .and_then(|details| details.get("code"))
        .and_then(Value::as_str)
}

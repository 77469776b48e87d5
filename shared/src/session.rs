use lambda_http::{http::StatusCode, Body, Error, Request, RequestExt, Response};
use serde::Serialize;
use std::sync::Arc;

/// Reactive data-access client handed to the UI. Built once per process,
/// shared read-only afterwards.
#[derive(Debug)]
pub struct DataClient {
    endpoint: String,
}

impl DataClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Session state as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedIn { user_id: String },
    SignedOut,
}

impl SessionState {
    /// Identity from the JWT authorizer `sub` claim. In local development the
    /// X-User-Id header takes precedence.
    pub fn from_request(event: &Request) -> Self {
        let user_id = event
            .headers()
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .or_else(|| {
                event
                    .request_context_ref()
                    .and_then(|ctx| ctx.authorizer())
                    .and_then(|auth| auth.jwt.as_ref())
                    .and_then(|jwt| jwt.claims.get("sub"))
                    .map(|s| s.to_string())
            })
            .filter(|id| !id.is_empty());

        match user_id {
            Some(user_id) => SessionState::SignedIn { user_id },
            None => SessionState::SignedOut,
        }
    }
}

/// The single session control shown above the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Affordance {
    SignInButton,
    UserButton { user_id: String },
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub signed_in: bool,
    pub affordance: Affordance,
    pub data_api_url: String,
    /// Whether the data client should attach the session's identity
    pub authenticated_client: bool,
}

/// Composes the shared data client with the caller's session
pub struct SessionProvider {
    client: Arc<DataClient>,
}

impl SessionProvider {
    pub fn new(client: Arc<DataClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<DataClient> {
        &self.client
    }

    pub fn render(&self, session: &SessionState) -> SessionView {
        let (signed_in, affordance) = match session {
            SessionState::SignedIn { user_id } => (
                true,
                Affordance::UserButton {
                    user_id: user_id.clone(),
                },
            ),
            SessionState::SignedOut => (false, Affordance::SignInButton),
        };

        SessionView {
            signed_in,
            affordance,
            data_api_url: self.client.endpoint().to_string(),
            authenticated_client: signed_in,
        }
    }
}

/// GET /session
pub async fn get_session(provider: &SessionProvider, event: &Request) -> Result<Response<Body>, Error> {
    let session = SessionState::from_request(event);
    tracing::info!("Session view requested, signed in: {}", matches!(session, SessionState::SignedIn { .. }));

    let view = provider.render(&session);

    let resp = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&view)?.into())
        .map_err(Box::new)?;
    Ok(resp)
}

//! Request-scoped dispatching and token security middleware

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::CrudConfig;
use crate::core::context::RequestContext;
use crate::core::error::ScaffoldError;
use crate::core::events::{EventDispatcher, Listener, REQUEST_START, REQUEST_TERMINATE, RequestEvent};
use crate::core::security::{TokenInfo, TokenService, extract_token};

/// Dispatcher of the current request, stored in request extensions
#[derive(Clone)]
pub struct ScopedDispatcher(pub Arc<EventDispatcher>);

/// Resets a request's dispatcher when dropped
struct ResetGuard(Arc<EventDispatcher>);

impl Drop for ResetGuard {
    fn drop(&mut self) {
        self.0.reset();
    }
}

/// Listeners installed on every request
pub type ListenerSet = Arc<Vec<Listener>>;

/// Give each request its own dispatcher loaded with `listeners`
///
/// `request.start` is dispatched before the inner service runs; a failing
/// start listener answers the request with its error. `request.terminate`
/// is dispatched on a spawned task once the response is ready, then the
/// dispatcher is reset.
pub async fn request_scope(
    State(listeners): State<ListenerSet>,
    mut req: Request,
    next: Next,
) -> Response {
    let dispatcher = Arc::new(EventDispatcher::with_listeners(listeners.iter().cloned()));
    let guard = ResetGuard(dispatcher.clone());

    let (parts, body) = req.into_parts();
    let mut ctx = RequestContext::from_parts(&parts);
    req = Request::from_parts(parts, body);

    let mut start = RequestEvent {
        method: ctx.method.to_string(),
        path: ctx.uri.path().to_string(),
        status: None,
    };
    if let Err(e) = dispatcher.dispatch(&mut ctx, REQUEST_START, &mut start).await {
        return e.into_response();
    }

    req.extensions_mut().insert(ScopedDispatcher(dispatcher.clone()));
    req.extensions_mut().insert(ctx.clone());

    let response = next.run(req).await;

    let mut end = RequestEvent {
        status: Some(response.status().as_u16()),
        ..start
    };
    tokio::spawn(async move {
        let _guard = guard;
        if let Err(e) = dispatcher.dispatch(&mut ctx, REQUEST_TERMINATE, &mut end).await {
            tracing::warn!(error = %e, path = %end.path, "request.terminate listener failed");
        }
    });

    response
}

/// Token checking settings of protected routes
#[derive(Clone, Debug)]
pub struct SecurityGuard {
    tokens: Option<TokenService>,
    cookie_name: Option<String>,
}

impl SecurityGuard {
    pub fn new(tokens: Option<TokenService>, cookie_name: Option<String>) -> Self {
        Self {
            tokens,
            cookie_name,
        }
    }

    pub fn from_config(config: &CrudConfig) -> Self {
        Self::new(config.token_service(), config.security.cookie_name.clone())
    }

    fn authenticate(&self, parts: &Parts) -> Result<TokenInfo, ScaffoldError> {
        let token = extract_token(&parts.headers, self.cookie_name.as_deref()).ok_or_else(|| {
            ScaffoldError::Unauthorized {
                message: "Authorization token is required".to_string(),
            }
        })?;

        let Some(tokens) = &self.tokens else {
            tracing::warn!("protected route hit without a configured token key");
            return Err(ScaffoldError::Unauthorized {
                message: "Authorization token is invalid".to_string(),
            });
        };

        tokens.parse_token(&token).map(TokenInfo)
    }
}

/// Reject requests without a valid token; store its payload as [`TokenInfo`]
pub async fn security_token_middleware(
    State(guard): State<SecurityGuard>,
    req: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    match guard.authenticate(&parts) {
        Ok(info) => {
            if let Some(ctx) = parts.extensions.get::<RequestContext>() {
                ctx.set_token(info.0.clone());
            }
            parts.extensions.insert(info);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(e) => {
            tracing::debug!(path = %parts.uri.path(), error = %e, "request rejected");
            e.into_response()
        }
    }
}

/// Context and dispatcher of the current request
///
/// Handlers dispatch resource events through it. Without the
/// [`request_scope`] middleware it holds an empty dispatcher.
pub struct RequestScope {
    pub ctx: RequestContext,
    pub dispatcher: Arc<EventDispatcher>,
}

impl<S> FromRequestParts<S> for RequestScope
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let dispatcher = parts
            .extensions
            .get::<ScopedDispatcher>()
            .map(|scoped| scoped.0.clone())
            .unwrap_or_default();

        let ctx = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(parts));
        if ctx.token().is_none() {
            if let Some(info) = parts.extensions.get::<TokenInfo>() {
                ctx.set_token(info.0.clone());
            }
        }

        Ok(Self { ctx, dispatcher })
    }
}

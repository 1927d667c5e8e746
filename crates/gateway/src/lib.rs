//! A chat provider for the hosted Voltcart LLM gateway.
//!
//! The gateway speaks an OpenAI-compatible chat-completions protocol:
//! an authenticated POST that either fails with a plain JSON error
//! status, or streams `data: <json>` server-sent events terminated by
//! `data: [DONE]`.

#[macro_use]
extern crate tracing;

mod config;
mod io;
mod proto;
mod response;

use std::error::Error as StdError;
use std::fmt::{self, Debug, Display};
use std::sync::Arc;

use mime::Mime;
use reqwest::{Client, StatusCode, header};
use voltcart_model::{
    ChatProvider, ChatRequest, CredentialSource, ErrorKind, GatewayError,
};

pub use config::{GatewayConfig, GatewayConfigBuilder};
use io::{Chunks, Lines};
pub use io::{StreamEvent, parse_line};
pub use response::GatewayResponse;

/// Error type for [`GatewayProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl GatewayError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// The hosted LLM gateway provider.
///
/// The bearer credential is fetched from the [`CredentialSource`]
/// before every request; a missing credential is reported as an
/// auth-required error without touching the network.
#[derive(Clone)]
pub struct GatewayProvider<C> {
    client: Client,
    config: Arc<GatewayConfig>,
    credentials: Arc<C>,
}

impl<C: CredentialSource> GatewayProvider<C> {
    /// Creates a new `GatewayProvider` with the given configuration
    /// and credential source.
    #[inline]
    pub fn new(config: GatewayConfig, credentials: C) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
            credentials: Arc::new(credentials),
        }
    }
}

impl<C> Debug for GatewayProvider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: CredentialSource + 'static> ChatProvider for GatewayProvider<C> {
    type Error = Error;
    type Stream = GatewayResponse;

    fn send_request(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<Self::Stream, Self::Error>> + Send + 'static
    {
        let gateway_req = proto::create_request(req, &self.config);
        let client = self.client.clone();
        let config = Arc::clone(&self.config);
        let credentials = Arc::clone(&self.credentials);

        async move {
            let Some(token) = credentials.bearer_token().await else {
                return Err(Error::new(
                    "no credential available",
                    ErrorKind::AuthRequired,
                ));
            };

            let resp_res = client
                .post(format!("{}{}", config.base_url, "/chat/completions"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::ACCEPT, "text/event-stream")
                .json(&gateway_req)
                .send()
                .await;
            let resp = match resp_res {
                Ok(resp) => resp,
                Err(err) => {
                    return Err(Error::new(format!("{err}"), ErrorKind::Other));
                }
            };

            let status = resp.status();
            if !status.is_success() {
                return Err(Error::new(
                    format!("gateway returned {status}"),
                    error_kind_for_status(status),
                ));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let is_event_stream = content_type
                .and_then(|v| v.parse().ok())
                .map(|m: Mime| {
                    m.type_() == mime::TEXT && m.subtype() == mime::EVENT_STREAM
                })
                .unwrap_or(false);
            if !is_event_stream {
                return Err(Error::new(
                    format!("unexpected content type: {content_type:?}"),
                    ErrorKind::Other,
                ));
            }

            // Here we got a successful streaming response.
            let lines = Lines::new(Chunks::from(resp));
            Ok(GatewayResponse::from_lines(lines))
        }
    }
}

fn error_kind_for_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => ErrorKind::AuthRequired,
        StatusCode::PAYMENT_REQUIRED => ErrorKind::QuotaExhausted,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        _ => ErrorKind::Other,
    }
}

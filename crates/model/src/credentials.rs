/// A source of short-lived bearer credentials.
///
/// The credential is fetched before every gateway request. Returning
/// `None` means no user is signed in; providers must surface that as
/// an [`ErrorKind::AuthRequired`](crate::ErrorKind::AuthRequired)
/// error instead of a generic failure.
pub trait CredentialSource: Send + Sync {
    /// Returns a bearer token, or `None` when no credential is
    /// currently available.
    fn bearer_token(&self) -> impl Future<Output = Option<String>> + Send;
}

/// A credential source that always yields the same token.
///
/// Mainly useful for tests and non-interactive embeddings.
#[derive(Clone, Debug)]
pub struct StaticCredential(String);

impl StaticCredential {
    /// Creates a new `StaticCredential` with the given token.
    #[inline]
    pub fn new<S: Into<String>>(token: S) -> Self {
        Self(token.into())
    }
}

impl CredentialSource for StaticCredential {
    fn bearer_token(&self) -> impl Future<Output = Option<String>> + Send {
        std::future::ready(Some(self.0.clone()))
    }
}

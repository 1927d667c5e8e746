/// The kind of error that occurred.
///
/// The session layer maps each kind to a distinct user-facing message,
/// so providers should classify failures as precisely as they can.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No valid credential is available, or the gateway rejected the
    /// credential (HTTP 401).
    AuthRequired,
    /// The account's gateway quota is exhausted (HTTP 402).
    QuotaExhausted,
    /// The gateway is rate limiting the caller (HTTP 429).
    RateLimited,
    /// Any other errors.
    Other,
}

use voltcart_model::ErrorKind;

/// The events in a preset response.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PresetEvent {
    /// A content delta.
    Delta(String),
    /// A mid-stream failure of the given kind.
    Fail(ErrorKind),
}

/// The preset response for an assistant turn.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PresetResponse {
    /// Events in this response.
    pub events: Vec<PresetEvent>,
    /// If set, the request itself fails with this kind before any
    /// event is produced (e.g. an HTTP error status).
    pub failure: Option<ErrorKind>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified events.
    #[inline]
    pub fn with_events(events: impl Into<Vec<PresetEvent>>) -> Self {
        Self {
            events: events.into(),
            failure: None,
        }
    }

    /// Creates a `PresetResponse` streaming the specified deltas.
    #[inline]
    pub fn with_deltas<I, S>(deltas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_events(
            deltas
                .into_iter()
                .map(|d| PresetEvent::Delta(d.into()))
                .collect::<Vec<_>>(),
        )
    }

    /// Creates a `PresetResponse` whose request fails before streaming.
    #[inline]
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            events: vec![],
            failure: Some(kind),
        }
    }
}

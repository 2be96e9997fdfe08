/// why a fetch from the realtime database produced no data
///
/// callers of the public fetch api never see this; it is logged and the
/// result collapses to "no data". kept typed so the log says what happened.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("response body too large ({0} bytes)")]
    TooLarge(u64),

    #[error("malformed JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

//! Server-sent event decoding shared by the streaming engines

use eventsource_stream::Eventsource;
use futures::{Stream, TryStreamExt, future};
use reqwest::Response;

use crate::error::InferenceError;

/// `data:` payloads of an SSE response, skipping keep-alive blanks
pub(crate) fn data_events(
    response: Response,
) -> impl Stream<Item = Result<String, InferenceError>> + Send {
    response
        .bytes_stream()
        .eventsource()
        .map_err(|e| InferenceError::StreamError(e.to_string()))
        .map_ok(|event| event.data)
        .try_filter(|data| future::ready(!data.trim().is_empty()))
}

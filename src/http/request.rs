//! Request view construction.
//!
//! # Responsibilities
//! - Normalize axum request parts into a `RequestView`
//! - Buffer small JSON bodies so the extractor can look inside them
//! - Hand back a request that downstream handlers can still read in full
//!
//! # Design Decisions
//! - Multi-valued headers become arrays; non-UTF-8 header values are dropped
//! - Repeated query keys become arrays, single keys plain strings
//! - Only bodies with a JSON content type and a known length within the limit
//!   are buffered; streaming bodies pass through untouched
//! - Bytes already read are always handed on, never dropped

use axum::body::{Body, Bytes};
use axum::extract::{FromRequestParts, RawPathParams};
use axum::http::{header, request::Parts, HeaderMap};
use futures_util::{stream, StreamExt};
use serde_json::Value;

use crate::trace::extractor::{Fields, RouteParams};

/// Header echoing the trace id back to the caller.
pub const X_TRACE_ID: &str = "x-trace-id";

pub fn header_fields(headers: &HeaderMap) -> Fields {
    let mut fields = Fields::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(|s| Value::String(s.to_string()))
            .collect();

        let value = match values.len() {
            0 => continue,
            1 => values.remove(0),
            _ => Value::Array(values),
        };
        fields.insert(name.as_str().to_string(), value);
    }
    fields
}

pub fn query_fields(query: Option<&str>) -> Fields {
    let mut fields = Fields::new();
    let Some(query) = query else {
        return fields;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match fields.get_mut(&*key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into_owned(), value);
            }
        }
    }
    fields
}

/// Matched route parameters, or empty when the router recorded none.
///
/// Wildcard captures (`{*rest}`) span several segments; those segments are
/// also exposed by position (`"0"`, `"1"`, ...) unless a named capture
/// already uses that key.
pub async fn route_params(parts: &mut Parts) -> RouteParams {
    let Ok(raw) = RawPathParams::from_request_parts(parts, &()).await else {
        return RouteParams::default();
    };

    let mut params = RouteParams::from_pairs(raw.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    for (_, value) in raw.iter().filter(|(_, v)| v.contains('/')) {
        let segments: Vec<String> = value
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        params.merge(RouteParams::from_segments(segments));
    }
    params
}

pub fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| {
            let mime = ct.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Buffer and parse a JSON body if it is small enough.
///
/// Returns the body to forward and the parsed value, if any. The forwarded
/// body always carries every byte read so far followed by whatever the
/// original body still holds: a body longer than its declared length is
/// replayed in full, and a read error is handed on to the handler.
pub async fn buffer_json_body(headers: &HeaderMap, body: Body, max_bytes: usize) -> (Body, Option<Value>) {
    if !is_json(headers) {
        return (body, None);
    }
    match content_length(headers) {
        Some(len) if len > 0 && len <= max_bytes => {}
        _ => return (body, None),
    }

    let mut stream = body.into_data_stream();
    let mut chunks: Vec<Bytes> = Vec::new();
    let mut read = 0usize;

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                read += bytes.len();
                chunks.push(bytes);
                if read > max_bytes {
                    tracing::debug!(read, max_bytes, "Request body exceeds declared length; not inspecting");
                    let replay = stream::iter(chunks.into_iter().map(Ok::<_, axum::Error>)).chain(stream);
                    return (Body::from_stream(replay), None);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to buffer request body for trace extraction");
                let replay = stream::iter(chunks.into_iter().map(Ok)).chain(stream::once(async move { Err(e) }));
                return (Body::from_stream(replay), None);
            }
        }
    }

    let bytes = Bytes::from(chunks.concat());
    let parsed = serde_json::from_slice::<Value>(&bytes).ok();
    (Body::from(bytes), parsed)
}

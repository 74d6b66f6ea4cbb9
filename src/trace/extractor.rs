//! Trace ID extraction from inbound requests.
//!
//! # Responsibilities
//! - Probe headers, query, body and route params for an upstream trace id
//! - Apply a fixed precedence: headers → query → body → params
//!
//! # Design Decisions
//! - Works against the `RequestLike` capability trait, never a framework type
//! - Strict typing: only non-empty strings match; numbers are not coerced
//! - Never fails: an unreadable source is "not found"

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON-shaped field bag (header, query or param values).
pub type Fields = Map<String, Value>;

/// Header names probed by the extractor's own default.
pub const DEFAULT_HEADERS: [&str; 3] = ["x-trace-id", "x-request-id", "x-correlation-id"];

/// Header names probed by the HTTP middleware's default.
pub const MIDDLEWARE_DEFAULT_HEADERS: [&str; 5] = [
    "x-trace-id",
    "x-request-id",
    "x-correlation-id",
    "trace-id",
    "request-id",
];

/// Anything exposing the four request locations the extractor understands.
///
/// Header values are strings or arrays of strings. Missing locations return
/// `None` and are skipped.
pub trait RequestLike {
    fn headers(&self) -> Option<&Fields> {
        None
    }

    fn query(&self) -> Option<&Fields> {
        None
    }

    fn body(&self) -> Option<&Value> {
        None
    }

    fn params(&self) -> Option<&Fields> {
        None
    }
}

/// Owned, normalized request view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestView {
    pub headers: Fields,
    pub query: Fields,
    pub body: Option<Value>,
    pub params: Fields,
}

impl RequestView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = params.into_fields();
        self
    }
}

impl RequestLike for RequestView {
    fn headers(&self) -> Option<&Fields> {
        Some(&self.headers)
    }

    fn query(&self) -> Option<&Fields> {
        Some(&self.query)
    }

    fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    fn params(&self) -> Option<&Fields> {
        Some(&self.params)
    }
}

/// Route parameters normalized to a flat `name → value` map.
///
/// Routers either hand out named captures or a positional list of path
/// segments; positional values are keyed by their index (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteParams(Fields);

impl RouteParams {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn from_segments<I, V>(segments: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self(
            segments
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.into()))
                .collect(),
        )
    }

    /// Add entries from `other` whose names are not already present.
    pub fn merge(&mut self, other: RouteParams) {
        for (name, value) in other.0 {
            self.0.entry(name).or_insert(value);
        }
    }

    pub fn into_fields(self) -> Fields {
        self.0
    }
}

/// Field names to probe per request location, in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractorConfig {
    #[serde(deserialize_with = "one_or_many")]
    pub header: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub query: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub body: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub params: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::headers_only(DEFAULT_HEADERS)
    }
}

impl ExtractorConfig {
    /// The broader header set the HTTP middleware probes by default.
    pub fn middleware_default() -> Self {
        Self::headers_only(MIDDLEWARE_DEFAULT_HEADERS)
    }

    pub fn headers_only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: names.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: Vec::new(),
            params: Vec::new(),
        }
    }
}

/// Resolves one trace id from a request.
#[derive(Debug, Clone, Default)]
pub struct TraceIdExtractor {
    config: ExtractorConfig,
}

impl TraceIdExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Replace the whole configuration.
    pub fn update_config(&mut self, config: ExtractorConfig) {
        self.config = config;
    }

    /// Return the first trace id found, trying headers, query, body, then
    /// params. Later locations are not consulted once one matches.
    pub fn extract_from_request(&self, request: &dyn RequestLike) -> Option<String> {
        self.from_headers(request.headers())
            .or_else(|| self.from_query(request.query()))
            .or_else(|| self.from_body(request.body()))
            .or_else(|| self.from_params(request.params()))
    }

    fn from_headers(&self, headers: Option<&Fields>) -> Option<String> {
        let headers = headers?;
        self.config.header.iter().find_map(|name| {
            let value = headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)?;
            let value = match value {
                Value::Array(items) => items.first()?,
                other => other,
            };
            non_empty_str(value)
        })
    }

    fn from_query(&self, query: Option<&Fields>) -> Option<String> {
        let query = query?;
        self.config
            .query
            .iter()
            .find_map(|key| query.get(key).and_then(non_empty_str))
    }

    fn from_body(&self, body: Option<&Value>) -> Option<String> {
        let body = body?;
        self.config
            .body
            .iter()
            .find_map(|path| lookup_path(body, path).and_then(non_empty_str))
    }

    fn from_params(&self, params: Option<&Fields>) -> Option<String> {
        let params = params?;
        self.config
            .params
            .iter()
            .find_map(|key| params.get(key).and_then(non_empty_str))
    }
}

/// Resolve a dotted path (`user.traceId`) against nested objects.
fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |node, segment| node.as_object()?.get(segment))
}

fn non_empty_str(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}

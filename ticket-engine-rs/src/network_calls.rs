//! Parsing of the `failedNetworkCalls` report field.
//!
//! Different client layers serialize the field differently: plain JSON,
//! form-escaped JSON or JSON encoded twice. Each form has its own strategy;
//! strategies run in order and the first one that yields a list wins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub const NETWORK_CALLS_KEY: &str = "failedNetworkCalls";
pub const RAW_NETWORK_CALLS_KEY: &str = "rawNetworkCallsJSON";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestData {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

/// One failed request captured by the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkCall {
    pub request_data: RequestData,
    pub response_status: i64,
    pub response_headers: String,
    pub response_body: String,
    pub page_url: String,
    pub timestamp: String,
}

pub type ParseStrategy = fn(&str) -> Option<Vec<NetworkCall>>;

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Parsed(Vec<NetworkCall>),

    /// No strategy understood the input; `raw` is the untouched field
    Unparsed { raw: String },
}

impl ParseOutcome {
    /// Structured calls; empty for unparsed input
    pub fn calls(&self) -> &[NetworkCall] {
        match self {
            ParseOutcome::Parsed(calls) => calls,
            ParseOutcome::Unparsed { .. } => &[],
        }
    }
}

/// Ordered list of parse strategies.
pub struct NetworkCallParser {
    strategies: Vec<(&'static str, ParseStrategy)>,
}

impl Default for NetworkCallParser {
    fn default() -> Self {
        Self {
            strategies: vec![
                ("direct", parse_direct as ParseStrategy),
                ("unquoted", parse_unquoted),
                ("double_encoded", parse_double_encoded),
            ],
        }
    }
}

impl NetworkCallParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy tried after the existing ones
    pub fn with_strategy(mut self, name: &'static str, strategy: ParseStrategy) -> Self {
        self.strategies.push((name, strategy));
        self
    }

    pub fn parse(&self, input: &str) -> ParseOutcome {
        if input.trim().is_empty() {
            return ParseOutcome::Parsed(Vec::new());
        }

        for (name, strategy) in &self.strategies {
            if let Some(calls) = strategy(input) {
                debug!(strategy = *name, count = calls.len(), "parsed failed network calls");
                return ParseOutcome::Parsed(calls);
            }
        }

        let sample: String = input.chars().take(100).collect();
        warn!(%sample, "could not parse failed network calls with any strategy");
        ParseOutcome::Unparsed {
            raw: input.to_string(),
        }
    }
}

/// Parse with the default strategy list
pub fn parse_network_calls(input: &str) -> ParseOutcome {
    NetworkCallParser::default().parse(input)
}

fn parse_direct(input: &str) -> Option<Vec<NetworkCall>> {
    serde_json::from_str(input).ok()
}

fn parse_unquoted(input: &str) -> Option<Vec<NetworkCall>> {
    let trimmed = input.trim();
    let inner = ['"', '\'']
        .iter()
        .find_map(|q| {
            (trimmed.len() >= 2 && trimmed.starts_with(*q) && trimmed.ends_with(*q))
                .then(|| &trimmed[1..trimmed.len() - 1])
        })
        .unwrap_or(trimmed);

    let unescaped = inner.replace("\\\"", "\"").replace("\\\\", "\\");
    parse_direct(&unescaped)
}

fn parse_double_encoded(input: &str) -> Option<Vec<NetworkCall>> {
    let decoded: String = serde_json::from_str(input.trim()).ok()?;
    parse_direct(&decoded)
}

/// What the network-calls section should show for a report
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkCallsContent {
    Calls(Vec<NetworkCall>),

    /// Valid JSON that is not a list of calls
    Generic(Value),
}

impl NetworkCallsContent {
    pub fn is_empty(&self) -> bool {
        match self {
            NetworkCallsContent::Calls(calls) => calls.is_empty(),
            NetworkCallsContent::Generic(value) => match value {
                Value::Null => true,
                Value::Array(items) => items.is_empty(),
                Value::Object(map) => map.is_empty(),
                _ => false,
            },
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            NetworkCallsContent::Calls(calls) => serde_json::to_value(calls).unwrap_or(Value::Array(Vec::new())),
            NetworkCallsContent::Generic(value) => value.clone(),
        }
    }
}

/// Structured reading of a reported network-calls field.
///
/// Strings go through the strategy list; strings no strategy understands are
/// tried as generic JSON before falling back to an empty list. The field
/// itself is left alone.
pub fn interpret_network_calls(field: Option<&Value>) -> NetworkCallsContent {
    match field {
        None | Some(Value::Null) => NetworkCallsContent::Calls(Vec::new()),
        Some(Value::String(raw)) => interpret_raw(raw).0,
        Some(value) => match serde_json::from_value::<Vec<NetworkCall>>(value.clone()) {
            Ok(calls) => NetworkCallsContent::Calls(calls),
            Err(_) => NetworkCallsContent::Generic(value.clone()),
        },
    }
}

/// Content for `raw`, and whether the raw text should be kept alongside it
fn interpret_raw(raw: &str) -> (NetworkCallsContent, bool) {
    match parse_network_calls(raw) {
        ParseOutcome::Parsed(calls) => (NetworkCallsContent::Calls(calls), !raw.trim().is_empty()),
        ParseOutcome::Unparsed { raw } => match serde_json::from_str::<Value>(&raw) {
            Ok(value) => {
                debug!("using failed network calls as generic JSON");
                (NetworkCallsContent::Generic(value), false)
            }
            Err(_) => (NetworkCallsContent::Calls(Vec::new()), true),
        },
    }
}

/// Replace a string network-calls field of `payload` with its structured form.
///
/// Used for form submissions, where the field always arrives as text. The raw
/// text is kept under `rawNetworkCallsJSON` unless only the generic JSON
/// reading succeeded. Non-string fields are left as they are.
pub fn resolve_network_calls(payload: &mut Map<String, Value>) -> NetworkCallsContent {
    let raw = match payload.get(NETWORK_CALLS_KEY) {
        Some(Value::String(raw)) => raw.clone(),
        other => return interpret_network_calls(other),
    };

    let (content, keep_raw) = interpret_raw(&raw);
    if keep_raw {
        payload.insert(RAW_NETWORK_CALLS_KEY.to_string(), Value::String(raw));
    }
    payload.insert(NETWORK_CALLS_KEY.to_string(), content.to_value());
    content
}

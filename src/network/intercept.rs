//! Interception point between the application under test and the network

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use super::counter::InFlightCounter;
use crate::{Result, StubtapeError};

/// Methods a pattern rule is installed for
pub const INTERCEPTED_METHODS: [&str; 4] = ["GET", "POST", "PUT", "DELETE"];

/// Compile `stubAPIPatterns` entries, failing on the first bad one
///
/// # Errors
///
/// Returns [`StubtapeError::InvalidPattern`] naming the offending pattern
pub fn compile_patterns<I, S>(patterns: I) -> Result<Vec<Regex>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|pattern| {
            let pattern = pattern.as_ref();
            Regex::new(pattern).map_err(|source| StubtapeError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
        })
        .collect()
}

/// Identifier pairing a response with the request it answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(u64);

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outbound request as seen by the network shim
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedRequest {
    /// HTTP method
    pub method: String,
    /// Full URL including host
    pub url: String,
    /// Request body, `null` when there is none
    pub body: Value,
}

impl ObservedRequest {
    /// Request without a body
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            body: Value::Null,
        }
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }
}

/// A completed, intercepted exchange handed to the active mode
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// Exchange identifier
    pub id: ExchangeId,
    /// HTTP method as observed
    pub method: String,
    /// Full URL
    pub url: String,
    /// Request body
    pub request_body: Value,
    /// Response body
    pub response_body: Value,
}

/// What the shim should do with a request
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Answer immediately with this body, no network
    Stub(Value),
    /// Send to the network and report the response back
    Intercept,
    /// Not covered by any rule
    PassThrough,
}

/// Returned by [`Interceptor::request_observed`]
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTicket {
    /// Pass back to [`Interceptor::response_observed`]
    pub id: ExchangeId,
    /// Routing decision for the request
    pub route: Route,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RouteKey {
    method: String,
    url: String,
}

impl RouteKey {
    fn new(method: &str, url: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug)]
struct PendingExchange {
    request: ObservedRequest,
    intercepted: bool,
}

/// Stub rules plus request/response bookkeeping for one test case
///
/// Every exchange must report exactly one request followed by exactly one
/// response. Across different exchanges events may arrive in any order.
/// All methods take `&self`, so one interceptor can be shared between tasks.
pub struct Interceptor {
    exact: DashMap<RouteKey, Value>,
    patterns: DashMap<String, Vec<Regex>>,
    pending: DashMap<ExchangeId, PendingExchange>,
    next_id: AtomicU64,
    counter: InFlightCounter,
}

impl Interceptor {
    /// Create an interceptor with no rules
    #[must_use]
    pub fn new(counter: InFlightCounter) -> Self {
        Self {
            exact: DashMap::new(),
            patterns: DashMap::new(),
            pending: DashMap::new(),
            next_id: AtomicU64::new(0),
            counter,
        }
    }

    /// Answer `method url` with a fixed body; returns `true` if an earlier rule was replaced
    pub fn stub_exact(&self, method: &str, url: &str, body: Value) -> bool {
        let replaced = self.exact.insert(RouteKey::new(method, url), body).is_some();
        if replaced {
            debug!("Exact stub {} {} replaced by later registration", method, url);
        }
        replaced
    }

    /// Intercept every `method` request whose URL matches `pattern`
    pub fn intercept_pattern(&self, method: &str, pattern: Regex) {
        debug!("Intercepting {} {}", method, pattern.as_str());
        self.patterns
            .entry(method.to_ascii_uppercase())
            .or_default()
            .push(pattern);
    }

    /// Decide how a request is handled; exact rules beat pattern rules
    #[must_use]
    pub fn route(&self, method: &str, url: &str) -> Route {
        if let Some(body) = self.exact.get(&RouteKey::new(method, url)) {
            return Route::Stub(body.value().clone());
        }

        let intercepted = self
            .patterns
            .get(&method.to_ascii_uppercase())
            .is_some_and(|rules| rules.iter().any(|re| re.is_match(url)));

        if intercepted {
            Route::Intercept
        } else {
            Route::PassThrough
        }
    }

    /// Report an outbound request
    pub fn request_observed(&self, request: ObservedRequest) -> RequestTicket {
        let id = ExchangeId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let route = self.route(&request.method, &request.url);

        debug!("Request {} {} {} -> {}", id, request.method, request.url, route_label(&route));

        self.pending.insert(
            id,
            PendingExchange {
                request,
                intercepted: route == Route::Intercept,
            },
        );
        self.counter.increment();

        RequestTicket { id, route }
    }

    /// Report the response to an earlier request
    ///
    /// Returns the completed exchange if it was intercepted by a pattern rule.
    ///
    /// # Errors
    ///
    /// Returns [`StubtapeError::UnknownExchange`] if `id` has no pending request
    pub fn response_observed(&self, id: ExchangeId, body: Value) -> Result<Option<Exchange>> {
        let (_, pending) = self
            .pending
            .remove(&id)
            .ok_or(StubtapeError::UnknownExchange(id.0))?;

        self.counter.decrement();

        debug!("Response {} {} {}", id, pending.request.method, pending.request.url);

        if !pending.intercepted {
            return Ok(None);
        }

        let ObservedRequest { method, url, body: request_body } = pending.request;
        Ok(Some(Exchange {
            id,
            method,
            url,
            request_body,
            response_body: body,
        }))
    }

    /// Requests observed but not yet answered (debounce not included)
    #[must_use]
    pub fn pending_exchanges(&self) -> usize {
        self.pending.len()
    }

    /// Number of exact stub rules
    #[must_use]
    pub fn exact_rule_count(&self) -> usize {
        self.exact.len()
    }

    /// Number of pattern rules across all methods
    #[must_use]
    pub fn pattern_rule_count(&self) -> usize {
        self.patterns.iter().map(|entry| entry.value().len()).sum()
    }

    /// The in-flight counter driven by this interceptor
    #[must_use]
    pub fn counter(&self) -> &InFlightCounter {
        &self.counter
    }
}

fn route_label(route: &Route) -> &'static str {
    match route {
        Route::Stub(_) => "stub",
        Route::Intercept => "intercept",
        Route::PassThrough => "pass-through",
    }
}

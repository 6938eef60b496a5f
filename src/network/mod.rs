//! Network boundary for Stubtape
//!
//! The shim that sees the application's traffic reports each request and
//! response here. The interceptor applies stub rules and drives the in-flight
//! counter the test driver polls for idleness.

mod counter;
mod intercept;

pub use counter::InFlightCounter;
pub use intercept::{
    compile_patterns, Exchange, ExchangeId, Interceptor, ObservedRequest, RequestTicket, Route,
    INTERCEPTED_METHODS,
};

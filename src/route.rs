//! Route storage.
//!
//! One [`Route`] per distinct pattern string, held in registration order —
//! that order is what gives the combined alternation its first-match
//! precedence. Re-registering a pattern mutates its method map in place;
//! re-registering a (pattern, method) pair overrides the previous handler
//! with a warning, never an error.

use std::collections::HashMap;

use tracing::warn;

use crate::handler::Endpoint;
use crate::method::Method;

pub(crate) struct Route {
    pub(crate) pattern: String,
    pub(crate) handlers: HashMap<Method, Endpoint>,
}

#[derive(Default)]
pub(crate) struct RouteTable {
    pub(crate) routes: Vec<Route>,
}

impl RouteTable {
    /// Registers `endpoint` under `pattern` for each of `methods`.
    pub(crate) fn register(&mut self, pattern: &str, methods: &[Method], endpoint: Endpoint) {
        let index = match self.routes.iter().position(|r| r.pattern == pattern) {
            Some(index) => index,
            None => {
                self.routes.push(Route {
                    pattern: pattern.to_owned(),
                    handlers: HashMap::new(),
                });
                self.routes.len() - 1
            }
        };
        let route = &mut self.routes[index];
        for &method in methods {
            if let Some(previous) = route.handlers.insert(method, endpoint.clone()) {
                warn!(
                    pattern,
                    method = %method,
                    previous = previous.name(),
                    replacement = endpoint.name(),
                    "route handler overridden"
                );
            }
        }
    }

    /// Patterns in registration order, for the alternation compiler.
    pub(crate) fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }
}

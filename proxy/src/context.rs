use crate::routes::RouteDef;
use std::collections::HashMap;

/// Values extracted from one inbound request.
///
/// Only the route's declared query parameters are kept, so a caller supplied
/// credential can never reach the upstream call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub path_params: HashMap<String, String>,
    pub query_params: Vec<(&'static str, Option<String>)>,
}

impl RequestContext {
    pub fn new(def: &RouteDef, path_params: HashMap<String, &str>, query: Option<&str>) -> Self {
        let query_params = def
            .query_params
            .iter()
            .map(|&name| (name, query.and_then(|q| first_query_value(q, name))))
            .collect();

        RequestContext {
            path_params: path_params
                .into_iter()
                .map(|(k, v)| (k, v.to_string()))
                .collect(),
            query_params,
        }
    }

    /// Declared parameters that were present on the request, in declaration order.
    pub fn present_query_params(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.query_params
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
    }
}

// A repeated parameter forwards its first value.
fn first_query_value(query: &str, name: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

use crate::errors::RouteTableError;
use hyper::Method;
use routing::{PathTemplate, Route, RouteActions};
use std::collections::HashSet;
use std::sync::Arc;

/// Static description of one gateway endpoint and the provider endpoint it maps to.
#[derive(Debug)]
pub struct RouteDef {
    /// Short name used in logs and metric tags
    pub name: &'static str,
    pub method: Method,
    /// Inbound path template, placeholders written as `{name}`
    pub path: &'static str,
    /// Provider path template, relative to the upstream base URL
    pub upstream_path: &'static str,
    /// Query parameters passed through to the provider, in forwarding order
    pub query_params: &'static [&'static str],
    /// `error` field of the envelope returned when the call fails
    pub error_label: &'static str,
}

pub static ROUTES: [RouteDef; 9] = [
    RouteDef {
        name: "sports",
        method: Method::GET,
        path: "/api/sports",
        upstream_path: "/sports",
        query_params: &[],
        error_label: "Failed to fetch sports",
    },
    RouteDef {
        name: "odds",
        method: Method::GET,
        path: "/api/sports/{sportKey}/odds",
        upstream_path: "/sports/{sportKey}/odds",
        query_params: &["regions", "markets"],
        error_label: "Failed to fetch odds",
    },
    RouteDef {
        name: "scores",
        method: Method::GET,
        path: "/api/sports/{sportKey}/scores",
        upstream_path: "/sports/{sportKey}/scores",
        query_params: &["date"],
        error_label: "Failed to fetch scores",
    },
    RouteDef {
        name: "events",
        method: Method::GET,
        path: "/api/sports/{sportKey}/events",
        upstream_path: "/sports/{sportKey}/events",
        query_params: &[],
        error_label: "Failed to fetch events",
    },
    RouteDef {
        name: "event_odds",
        method: Method::GET,
        path: "/api/sports/{sportKey}/events/{eventId}/odds",
        upstream_path: "/sports/{sportKey}/events/{eventId}/odds",
        query_params: &["regions", "markets"],
        error_label: "Failed to fetch event odds",
    },
    RouteDef {
        name: "participants",
        method: Method::GET,
        path: "/api/sports/{sportKey}/participants",
        upstream_path: "/sports/{sportKey}/participants",
        query_params: &[],
        error_label: "Failed to fetch participants",
    },
    RouteDef {
        name: "historical_odds",
        method: Method::GET,
        path: "/api/historical/sports/{sportKey}/odds",
        upstream_path: "/historical/sports/{sportKey}/odds",
        query_params: &["date"],
        error_label: "Failed to fetch historical odds",
    },
    RouteDef {
        name: "historical_events",
        method: Method::GET,
        path: "/api/historical/sports/{sportKey}/events",
        upstream_path: "/historical/sports/{sportKey}/events",
        query_params: &["date"],
        error_label: "Failed to fetch historical events",
    },
    RouteDef {
        name: "historical_event_odds",
        method: Method::GET,
        path: "/api/historical/sports/{sportKey}/events/{eventId}/odds",
        upstream_path: "/historical/sports/{sportKey}/events/{eventId}/odds",
        query_params: &["date"],
        error_label: "Failed to fetch historical event odds",
    },
];

/// A route definition with its upstream template parsed once at startup.
#[derive(Debug)]
pub struct Endpoint {
    pub def: &'static RouteDef,
    pub upstream_path: PathTemplate,
}

pub type RouteTable = RouteActions<Arc<Endpoint>>;

/// Builds the router over `defs`, rejecting definitions whose upstream template
/// uses a placeholder the inbound template does not bind.
pub fn build_route_table(defs: &'static [RouteDef]) -> Result<RouteTable, RouteTableError> {
    let mut seen = HashSet::new();
    let mut routes = Vec::with_capacity(defs.len());

    for def in defs {
        if !seen.insert((def.method.clone(), def.path)) {
            return Err(RouteTableError::DuplicateRoute(
                def.method.to_string(),
                def.path,
            ));
        }

        let route = Route::new(
            def.method.clone(),
            def.path,
            Arc::new(Endpoint {
                def,
                upstream_path: PathTemplate::parse(def.upstream_path),
            }),
        );

        let bound: HashSet<&str> = route.path().params().collect();
        if let Some(unbound) = route
            .action()
            .upstream_path
            .params()
            .find(|p| !bound.contains(p))
        {
            return Err(RouteTableError::UnboundUpstreamParam {
                route: def.name,
                source: routing::TemplateError::UnboundParam(unbound.to_string()),
            });
        }

        routes.push(route);
    }

    Ok(RouteActions::new(routes))
}

use http::Method;
use std::collections::HashMap;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum TemplateError {
    #[error("no value bound for placeholder {{{0}}}")]
    UnboundParam(String),
}

#[derive(Debug, PartialEq)]
enum PathSegment {
    Static(String),
    Param(String),
}

#[derive(Debug)]
pub struct PathTemplate {
    segments: Vec<PathSegment>,
}

impl PathTemplate {
    /// Parses a path pattern string into a PathTemplate
    /// Supports:
    /// - Static segments: "/api/sports"
    /// - Dynamic parameters: "/api/sports/{sportKey}/odds"
    pub fn parse(path_str: &str) -> Self {
        let normalized_path = path_str.trim().trim_matches('/');

        let segments: Vec<PathSegment> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path
                .split('/')
                .map(|s| {
                    if let Some(stripped) = s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                        PathSegment::Param(stripped.to_string())
                    } else {
                        PathSegment::Static(s.to_string())
                    }
                })
                .collect()
        };

        PathTemplate { segments }
    }

    /// Names of the placeholders in this template, in order of appearance.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|seg| match seg {
            PathSegment::Param(name) => Some(name.as_str()),
            PathSegment::Static(_) => None,
        })
    }

    /// Matches a request path against this template.
    /// Returns Some(params) if match succeeds, None otherwise.
    fn matches<'a>(&self, request_path: &'a str) -> Option<HashMap<String, &'a str>> {
        let normalized_path = request_path.trim().trim_matches('/');

        let request_segments: Vec<&'a str> = if normalized_path.is_empty() {
            vec![]
        } else {
            normalized_path.split('/').collect()
        };

        if request_segments.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (seg, req_segment) in self.segments.iter().zip(request_segments) {
            match seg {
                PathSegment::Static(s) => {
                    if req_segment != s.as_str() {
                        return None;
                    }
                }
                PathSegment::Param(name) => {
                    // Empty and dot segments never bind a placeholder
                    if req_segment.is_empty() || is_dot_segment(req_segment) {
                        return None;
                    }
                    params.insert(name.clone(), req_segment);
                }
            }
        }

        Some(params)
    }

    /// Substitutes placeholder values into the template.
    /// Values are inserted as given, without further escaping.
    pub fn render<V: AsRef<str>>(&self, params: &HashMap<String, V>) -> Result<String, TemplateError> {
        let mut rendered = String::new();
        for seg in &self.segments {
            rendered.push('/');
            match seg {
                PathSegment::Static(s) => rendered.push_str(s),
                PathSegment::Param(name) => {
                    let value = params
                        .get(name)
                        .ok_or_else(|| TemplateError::UnboundParam(name.clone()))?;
                    rendered.push_str(value.as_ref());
                }
            }
        }

        if rendered.is_empty() {
            rendered.push('/');
        }
        Ok(rendered)
    }
}

/// `.` or `..`, literal or percent-encoded. URL normalization would collapse
/// these once the value is substituted into another path.
fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

#[derive(Debug, PartialEq)]
pub struct RouteMatch<'a, A> {
    pub params: HashMap<String, &'a str>,
    pub action: &'a A,
}

#[derive(Debug)]
pub struct Route<A> {
    method: Method,
    path: PathTemplate,
    action: A,
}

impl<A> Route<A> {
    /// Creates a new Route with the given method, path, and action
    pub fn new(method: Method, path: &str, action: A) -> Self {
        Self {
            method,
            path: PathTemplate::parse(path),
            action,
        }
    }

    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    pub fn action(&self) -> &A {
        &self.action
    }

    /// Returns Some(RouteMatch) if the request matches this route, None otherwise.
    /// Trailing slash normalization is applied to incoming requests.
    pub fn matches<'a>(
        &'a self,
        request_method: &Method,
        request_path: &'a str,
    ) -> Option<RouteMatch<'a, A>> {
        if &self.method != request_method {
            return None;
        }

        let params = self.path.matches(request_path)?;
        Some(RouteMatch {
            params,
            action: &self.action,
        })
    }
}

#[derive(Debug)]
pub struct RouteActions<A> {
    routes: Vec<Route<A>>,
}

impl<A> RouteActions<A> {
    pub fn new(routes: Vec<Route<A>>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route<A>] {
        &self.routes
    }

    /// Matches the incoming request to a route, and returns the first matched route if any.
    /// If no matches are found, return none.
    pub fn resolve<'a, B>(&'a self, request: &'a http::Request<B>) -> Option<RouteMatch<'a, A>> {
        self.resolve_path(request.method(), request.uri().path())
    }

    pub fn resolve_path<'a>(
        &'a self,
        method: &Method,
        path: &'a str,
    ) -> Option<RouteMatch<'a, A>> {
        self.routes
            .iter()
            .find_map(|route| route.matches(method, path))
    }
}

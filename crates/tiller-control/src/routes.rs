//! Route synthesis: from a schema descriptor to an HTTP surface.
//!
//! Walks the session's schema depth-first (parent before children, fields in
//! declared order) and registers a get and a write route for every node, on
//! top of the whole-state routes. Each handler is a closure capturing the
//! shared session handle, so every handler operates on the same live state
//! instance.

use crate::config::ControlConfig;
use crate::error::ControlResult;
use crate::session::ControlSession;
use axum::extract::Query;
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tiller_state::{Path, StateError, Value};

/// Body returned by every successful write endpoint.
const SUCCESS: &str = "success";

/// One synthesized route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    /// HTTP method.
    pub method: &'static str,
    /// Full route path, prefix included.
    pub path: String,
    /// Human-readable description.
    pub description: String,
}

/// The catalog of synthesized routes, served at the docs path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteCatalog {
    routes: Vec<RouteEntry>,
}

impl RouteCatalog {
    fn push(&mut self, method: &'static str, path: String, description: impl Into<String>) {
        self.routes.push(RouteEntry {
            method,
            path,
            description: description.into(),
        });
    }

    /// The synthesized routes, in registration order.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Number of synthesized routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    path: String,
}

/// Synthesize the full route surface for a session.
///
/// Returns the router and the catalog describing it. The catalog itself is
/// served with `GET` at the configured docs path.
pub fn synthesize(session: Arc<ControlSession>, config: &ControlConfig) -> (Router, RouteCatalog) {
    let prefix = normalize_prefix(&config.prefix);
    let mut router = Router::new();
    let mut catalog = RouteCatalog::default();

    // Whole-state routes first, then every node of the tree.
    let url = format!("{prefix}/get");
    let s = session.clone();
    router = router.route(
        &url,
        get(move || {
            let s = s.clone();
            async move { s.read_state().map(Json) }
        }),
    );
    catalog.push("GET", url, "Get the whole state");

    let url = format!("{prefix}/set");
    let s = session.clone();
    router = router.route(
        &url,
        patch(move |Json(update): Json<Value>| {
            let s = s.clone();
            async move { s.merge_state(&update).map(|_| SUCCESS) }
        }),
    );
    catalog.push(
        "PATCH",
        url,
        "Patch the whole state. Partial updates are supported.",
    );

    let url = format!("{prefix}/reset");
    let s = session.clone();
    router = router.route(
        &url,
        delete(move || {
            let s = s.clone();
            async move { s.reset().map(|_| SUCCESS) }
        }),
    );
    catalog.push("DELETE", url, "Reset the whole state to its initial value");

    let url = format!("{prefix}/get_from_path");
    let s = session.clone();
    router = router.route(
        &url,
        get(move |Query(query): Query<PathQuery>| {
            let s = s.clone();
            async move {
                let path = Path::parse(&query.path);
                if path.is_empty() {
                    return Err(StateError::invalid_path(
                        "the path query must name at least one field",
                    )
                    .into());
                }
                s.read_path(&path).map(Json)
            }
        }),
    );
    catalog.push("GET", url, "Get a value by dot-separated path");

    let url = format!("{prefix}/stop");
    let s = session.clone();
    router = router.route(
        &url,
        post(move || {
            let s = s.clone();
            async move { s.stop().map(|_| SUCCESS) }
        }),
    );
    catalog.push("POST", url, "Stop the control server");

    // Per-node routes: depth-first, parent before children, declared order.
    let mut nodes: Vec<(Path, bool)> = Vec::new();
    session.schema().visit(&mut |path, node| {
        if !path.is_empty() {
            nodes.push((path.clone(), node.is_leaf()));
        }
    });

    for (path, is_leaf) in nodes {
        let url = format!("{prefix}/get/{}", path.route_path());
        let s = session.clone();
        let p = path.clone();
        router = router.route(
            &url,
            get(move || {
                let s = s.clone();
                let p = p.clone();
                async move { s.read_path(&p).map(Json) }
            }),
        );
        catalog.push("GET", url, format!("Get {path}"));

        let url = format!("{prefix}/set/{}", path.route_path());
        let s = session.clone();
        let p = path.clone();
        if is_leaf {
            // put replaces the value wholesale; patch merges
            router = router.route(
                &url,
                put(move |Json(value): Json<Value>| {
                    let s = s.clone();
                    let p = p.clone();
                    async move { s.write_path(&p, value).map(|_| SUCCESS) }
                }),
            );
            catalog.push("PUT", url, format!("Set {path}"));
        } else {
            router = router.route(
                &url,
                patch(move |Json(value): Json<Value>| {
                    let s = s.clone();
                    let p = p.clone();
                    async move { s.write_path(&p, value).map(|_| SUCCESS) }
                }),
            );
            catalog.push(
                "PATCH",
                url,
                format!("Patch {path}. Partial updates are supported."),
            );
        }
    }

    let docs_url = normalize_docs_path(&config.docs_path);
    catalog.push("GET", docs_url.clone(), "Route catalog");
    let served_catalog = catalog.clone();
    router = router.route(
        &docs_url,
        get(move || {
            let catalog = served_catalog.clone();
            async move { ControlResult::Ok(Json(catalog)) }
        }),
    );

    (router, catalog)
}

/// Normalize a route prefix: empty stays empty, anything else gets a leading
/// slash and loses trailing slashes.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Normalize the docs path to a leading-slash route.
fn normalize_docs_path(docs_path: &str) -> String {
    let trimmed = docs_path.trim_matches('/');
    if trimmed.is_empty() {
        "/".into()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tiller_state::Controllable;

    #[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
    struct Head {
        activation: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
    struct Model {
        hidden_dim: Vec<u32>,
        #[control(nested)]
        head: Head,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Controllable)]
    struct TrainState {
        lr: f64,
        #[control(nested)]
        model: Model,
    }

    fn state() -> TrainState {
        TrainState {
            lr: 0.001,
            model: Model {
                hidden_dim: vec![128],
                head: Head {
                    activation: "relu".into(),
                },
            },
        }
    }

    fn catalog_for(config: &ControlConfig) -> RouteCatalog {
        let session = Arc::new(ControlSession::attach(&state()).unwrap());
        let (_router, catalog) = synthesize(session, config);
        catalog
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix("ctl"), "/ctl");
        assert_eq!(normalize_prefix("/ctl/"), "/ctl");
    }

    #[test]
    fn test_catalog_contains_node_routes_in_order() {
        let catalog = catalog_for(&ControlConfig::default());
        let paths: Vec<(&str, &str)> = catalog
            .routes()
            .iter()
            .map(|r| (r.method, r.path.as_str()))
            .collect();

        assert_eq!(
            paths,
            vec![
                ("GET", "/get"),
                ("PATCH", "/set"),
                ("DELETE", "/reset"),
                ("GET", "/get_from_path"),
                ("POST", "/stop"),
                ("GET", "/get/lr"),
                ("PUT", "/set/lr"),
                ("GET", "/get/model"),
                ("PATCH", "/set/model"),
                ("GET", "/get/model/hidden_dim"),
                ("PUT", "/set/model/hidden_dim"),
                ("GET", "/get/model/head"),
                ("PATCH", "/set/model/head"),
                ("GET", "/get/model/head/activation"),
                ("PUT", "/set/model/head/activation"),
                ("GET", "/"),
            ]
        );
    }

    #[test]
    fn test_prefix_applies_to_all_routes() {
        let catalog = catalog_for(&ControlConfig::default().with_prefix("/ctl"));
        for route in catalog.routes() {
            if route.path != "/" {
                assert!(
                    route.path.starts_with("/ctl/"),
                    "route {} missing prefix",
                    route.path
                );
            }
        }
    }

    #[test]
    fn test_leaf_writes_are_put_composite_writes_are_patch() {
        let catalog = catalog_for(&ControlConfig::default());
        let method_of = |path: &str| {
            catalog
                .routes()
                .iter()
                .find(|r| r.path == path)
                .map(|r| r.method)
        };
        assert_eq!(method_of("/set/lr"), Some("PUT"));
        assert_eq!(method_of("/set/model"), Some("PATCH"));
        assert_eq!(method_of("/set/model/hidden_dim"), Some("PUT"));
        assert_eq!(method_of("/set/model/head"), Some("PATCH"));
    }
}

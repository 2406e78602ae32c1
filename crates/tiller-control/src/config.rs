//! Configuration surface for a control server.

/// Configuration for serving a control session.
///
/// All values pass through opaquely to the transport layer.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Host to bind the listener on.
    pub host: String,
    /// Port to bind the listener on. Use `0` to pick a free port.
    pub port: u16,
    /// Prefix prepended to every synthesized route (e.g. `/ctl`).
    pub prefix: String,
    /// Route serving the route catalog (the documentation root).
    pub docs_path: String,
    /// Start serving immediately, or let the caller drive the listener
    /// lifecycle.
    pub serve: bool,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4444,
            prefix: String::new(),
            docs_path: "/".into(),
            serve: true,
        }
    }
}

impl ControlConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host (builder pattern).
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port (builder pattern).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the route prefix (builder pattern).
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the docs route (builder pattern).
    pub fn with_docs_path(mut self, docs_path: impl Into<String>) -> Self {
        self.docs_path = docs_path.into();
        self
    }

    /// Choose whether `control` starts serving immediately (builder pattern).
    pub fn with_serve(mut self, serve: bool) -> Self {
        self.serve = serve;
        self
    }

    /// The address the listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub query_store: QueryStoreConfig,
    pub jobbrowser: JobBrowserConfig,
    pub security: SecurityConfig,
    pub backends: BackendsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub enable_cors: bool,
}

/// Upstream query store reached through the pass-through proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryStoreConfig {
    pub server_url: String,
    /// Forward `query-proxy` requests upstream instead of serving them locally
    pub use_proxy: bool,
    /// Negotiate credentials with the upstream (`Authorization: Negotiate`)
    pub use_sasl: bool,
    pub negotiate_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobBrowserConfig {
    pub disable_killing_jobs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Members of these groups list roles across all groups
    pub admin_groups: Vec<String>,
}

/// Base URLs of the backend bridges. Unset means the family is not registered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    pub job_api_url: Option<String>,
    pub sentry_api_url: Option<String>,
    pub catalog_api_url: Option<String>,
    pub solr_url: Option<String>,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("GATEWAY_BIND") {
            self.server.bind = v.parse().unwrap_or(self.server.bind);
        }
        if let Ok(v) = env::var("PORT") {
            if let Ok(port) = v.parse::<u16>() {
                self.server.bind.set_port(port);
            }
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.server.enable_cors = v.parse().unwrap_or(self.server.enable_cors);
        }

        // Query store overrides
        if let Ok(v) = env::var("QUERY_STORE_SERVER_URL") {
            self.query_store.server_url = v;
        }
        if let Ok(v) = env::var("JOBBROWSER_USE_PROXY") {
            self.query_store.use_proxy = v.parse().unwrap_or(self.query_store.use_proxy);
        }
        if let Ok(v) = env::var("USE_SASL") {
            self.query_store.use_sasl = v.parse().unwrap_or(self.query_store.use_sasl);
        }
        if let Ok(v) = env::var("QUERY_STORE_NEGOTIATE_TOKEN") {
            self.query_store.negotiate_token = Some(v).filter(|t| !t.trim().is_empty());
        }

        // Job browser overrides
        if let Ok(v) = env::var("JOBBROWSER_DISABLE_KILLING_JOBS") {
            self.jobbrowser.disable_killing_jobs =
                v.parse().unwrap_or(self.jobbrowser.disable_killing_jobs);
        }

        // Security overrides
        if let Ok(v) = env::var("SENTRY_ADMIN_GROUPS") {
            self.security.admin_groups = split_list(&v);
        }

        // Backend bridges
        self.backends.job_api_url = non_empty_var("JOB_API_URL").or(self.backends.job_api_url);
        self.backends.sentry_api_url =
            non_empty_var("SENTRY_API_URL").or(self.backends.sentry_api_url);
        self.backends.catalog_api_url =
            non_empty_var("CATALOG_API_URL").or(self.backends.catalog_api_url);
        self.backends.solr_url = non_empty_var("SOLR_URL").or(self.backends.solr_url);

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
                enable_cors: true,
            },
            query_store: QueryStoreConfig {
                server_url: "http://localhost:8190".to_string(),
                use_proxy: false,
                use_sasl: false,
                negotiate_token: None,
            },
            jobbrowser: JobBrowserConfig {
                disable_killing_jobs: false,
            },
            security: SecurityConfig {
                admin_groups: Vec::new(),
            },
            backends: BackendsConfig::default(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
                enable_cors: false,
            },
            jobbrowser: JobBrowserConfig {
                disable_killing_jobs: true,
            },
            ..Self::development()
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use strata_auth::config::AuthConfig;
use strata_auth::types::{ProtectedResource, Role, User};
use strata_db_memory::DirectorySeed;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Authorization and audit configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Subject resolution and redirect targets
    #[serde(default)]
    pub session: SessionConfig,
    /// Directory contents loaded at startup
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        if self.server.audit_page_limit == 0 {
            return Err("server.audit_page_limit must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Session validation
        if self.session.subject_header.trim().is_empty() {
            return Err("session.subject_header must not be empty".into());
        }
        if axum::http::HeaderName::from_bytes(self.session.subject_header.as_bytes()).is_err() {
            return Err(format!(
                "session.subject_header is not a valid header name: {}",
                self.session.subject_header
            ));
        }
        for (key, path) in [
            ("session.login_path", &self.session.login_path),
            ("session.dashboard_path", &self.session.dashboard_path),
        ] {
            if !path.starts_with('/') {
                return Err(format!("{key} must be an absolute path"));
            }
        }
        // Auth validation
        self.auth.validate().map_err(|e| format!("auth: {e}"))?;
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    /// Upper bound on entries returned by the audit listing.
    #[serde(default = "default_audit_page_limit")]
    pub audit_page_limit: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8080
}
fn default_body_limit() -> usize {
    64 * 1024
}
fn default_audit_page_limit() -> usize {
    200
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
            audit_page_limit: default_audit_page_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}
fn default_log_level() -> String {
    "info".into()
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// How the subject is resolved and where guard outcomes redirect.
///
/// Authentication happens upstream; the proxy forwards the authenticated
/// user id in `subject_header`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_subject_header")]
    pub subject_header: String,
    /// Cookie cleared when a session turns out to be stale.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_dashboard_path")]
    pub dashboard_path: String,
}

fn default_subject_header() -> String {
    "x-strata-user".into()
}
fn default_session_cookie() -> String {
    "session".into()
}
fn default_login_path() -> String {
    "/login".into()
}
fn default_dashboard_path() -> String {
    "/dashboard".into()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            subject_header: default_subject_header(),
            session_cookie: default_session_cookie(),
            login_path: default_login_path(),
            dashboard_path: default_dashboard_path(),
        }
    }
}

/// Seed data for the in-memory directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Add the built-in `admin`, `staff` and `student` roles.
    #[serde(default = "default_true")]
    pub default_roles: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub resources: Vec<ProtectedResource>,
}

fn default_true() -> bool {
    true
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            default_roles: true,
            roles: Vec::new(),
            users: Vec::new(),
            resources: Vec::new(),
        }
    }
}

impl BootstrapConfig {
    /// Converts the bootstrap section into directory seed data.
    pub fn to_seed(&self) -> DirectorySeed {
        let seed = DirectorySeed {
            roles: self.roles.clone(),
            users: self.users.clone(),
            resources: self.resources.clone(),
        };
        if self.default_roles {
            seed.with_default_roles()
        } else {
            seed
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("strata.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., STRATA__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("STRATA")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}

//! Shared constants used across the admin server

/// Role required for every management action
pub const ADMIN_ROLE: &str = "Admin";

/// Realm advertised in `WWW-Authenticate` challenges
pub const AUTH_REALM: &str = "Arbor";

/// Port used when `ARBOR_PORT` is not set
pub const DEFAULT_PORT: u16 = 3001;

/// Account created when nothing else is configured
pub const DEFAULT_ADMIN_USER: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "zaq1@WSX";

/// Where tree-changing actions send the browser afterwards
pub const INDEX_PATH: &str = "/management";

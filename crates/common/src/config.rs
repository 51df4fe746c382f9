//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Uploaded media configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Session and login configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Groups ensured to exist at start-up.
    #[serde(default)]
    pub groups: Vec<GroupSeed>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Where uploaded post images live and how they are served.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory uploaded files are written to.
    #[serde(default = "default_media_root")]
    pub root: PathBuf,
    /// URL prefix the media directory is served under.
    #[serde(default = "default_media_url")]
    pub url: String,
    /// Largest accepted image upload, in bytes.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: default_media_root(),
            url: default_media_url(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// Session and login configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Path unauthenticated visitors are redirected to.
    #[serde(default = "default_login_url")]
    pub login_url: String,
    /// Name of the cookie holding the session token.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            cookie_name: default_cookie_name(),
        }
    }
}

/// A group the server creates (or refreshes) on start-up.
#[derive(Debug, Clone, Deserialize)]
pub struct GroupSeed {
    /// Unique slug used in `/group/{slug}/`.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    1
}

fn default_media_root() -> PathBuf {
    PathBuf::from("./media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

const fn default_max_image_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_login_url() -> String {
    "/auth/login/".to_string()
}

fn default_cookie_name() -> String {
    "quire_session".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `QUIRE_ENV`)
    /// 4. Environment variables with `QUIRE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("QUIRE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUIRE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("QUIRE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "https://blog.example"

                [database]
                url = "postgres://localhost/quire"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.auth.login_url, "/auth/login/");
        assert_eq!(config.auth.cookie_name, "quire_session");
        assert_eq!(config.media.url, "/media");
        assert!(config.groups.is_empty());
    }

    #[test]
    fn test_group_seeds() {
        let config: Config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [server]
                url = "https://blog.example"

                [database]
                url = "postgres://localhost/quire"

                [[groups]]
                slug = "cats"
                title = "Cats"
                description = "Everything about cats"

                [[groups]]
                slug = "dogs"
                title = "Dogs"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].slug, "cats");
        assert_eq!(config.groups[1].description, "");
    }
}

use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub cookie: CookieSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    /// Development mode relaxes cookie attributes (no Secure flag,
    /// SameSite=None) so a local frontend on another origin can talk to us.
    pub development: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing settings.
///
/// Expiries are human-readable duration strings ("15m", "7d") parsed once
/// when the token issuer is built; a malformed value aborts startup.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expires_in: String,
    pub refresh_token_expires_in: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct CookieSettings {
    pub domain: String,
}

/// Loads settings from the optional `configuration` file, overridden by
/// `APP__`-prefixed environment variables (e.g. `APP__JWT__SECRET`).
/// Missing required keys fail deserialization and abort startup.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}

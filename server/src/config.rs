use serde::Deserialize;

/// Server settings, read from `TODO_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Loads configuration from `TODO_HOST` and `TODO_PORT`.
    pub fn from_env() -> Result<Self, ::config::ConfigError> {
        Self::from_source(::config::Environment::with_prefix("TODO"))
    }

    fn from_source(environment: ::config::Environment) -> Result<Self, ::config::ConfigError> {
        ::config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9285
}

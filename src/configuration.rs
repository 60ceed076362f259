use serde;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub app_port: u16,
    pub app_host: String,
    pub auth_url: String,
    pub storage: StorageSettings,
    #[serde(default)]
    pub realtime: RealtimeSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub database_name: String,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct StorageSettings {
    /// Base url of the object storage API, e.g. `https://<project>.supabase.co/storage/v1`
    pub url: String,
    pub service_key: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_signed_url_ttl")]
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RealtimeSettings {
    /// Capacity of each topic's broadcast buffer. Slow receivers skip what they missed.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_interval_secs: u64,
    #[serde(default = "default_client_timeout_secs")]
    pub client_timeout_secs: u64,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_chat_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
}

fn default_bucket() -> String {
    "ticket-attachments".to_string()
}

fn default_signed_url_ttl() -> u64 {
    3600
}

fn default_channel_capacity() -> usize {
    256
}

fn default_heartbeat_secs() -> u64 {
    5
}

fn default_client_timeout_secs() -> u64 {
    10
}

fn default_chat_timeout() -> u64 {
    120
}

fn default_openai_url() -> String {
    crate::connectors::llm::OPENAI_API_URL.to_string()
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
            heartbeat_interval_secs: default_heartbeat_secs(),
            client_timeout_secs: default_client_timeout_secs(),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_chat_timeout(),
            openai_url: default_openai_url(),
        }
    }
}

impl DatabaseSettings {
    // Connection string: postgresql://<username>:<password>@<host>:<port>/<database_name>
    pub fn connection_string(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name,
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgresql://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port,
        )
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // configuration.yaml first, then APP__DATABASE__HOST style overrides
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration"))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

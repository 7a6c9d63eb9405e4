use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_vision_llm")]
    pub vision: LlmConfig,
    #[serde(default = "default_solver_llm")]
    pub solver: LlmConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Empty means the provider's default endpoint.
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base address used for stored image URLs.
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default)]
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default)]
    pub image_delivery: ImageDelivery,
}

const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

/// Hosted service speaking the OpenAI chat completions protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAi,
    Together,
}

impl Provider {
    /// `None` leaves async-openai on its built-in OpenAI endpoint.
    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => None,
            Self::Together => Some(TOGETHER_BASE_URL),
        }
    }
}

impl LlmConfig {
    pub fn api_base(&self) -> Option<&str> {
        if self.base_url.is_empty() {
            self.provider.default_base_url()
        } else {
            Some(&self.base_url)
        }
    }
}

/// How the recognition image reaches the vision provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageDelivery {
    /// Embedded in the request as a data URL.
    #[default]
    Inline,
    /// Saved to the image store and referenced by its public URL.
    Url,
}

impl ServerConfig {
    pub fn public_base_url(&self) -> String {
        match &self.public_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.port),
        }
    }
}

impl Config {
    pub fn validate(&self) -> crate::Result<()> {
        if self.recognition.max_chars == 0 {
            return Err(crate::Error::config(
                "recognition.max_chars must be greater than zero",
            ));
        }
        if self.storage.sweep_interval_secs == 0 {
            return Err(crate::Error::config(
                "storage.sweep_interval_secs must be greater than zero",
            ));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(crate::Error::config(
                "server.body_limit_bytes must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Applies environment overrides on top of the file configuration.
    /// `lookup` is `std::env::var` in production.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(url) = lookup("PUBLIC_URL") {
            self.server.public_url = Some(url);
        }
        if let Some(dir) = lookup("TEMP_DIR") {
            self.storage.temp_dir = dir;
        }
        if let Some(key) = lookup("TOGETHER_API_KEY") {
            self.vision.api_key = key;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.solver.api_key = key;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            vision: default_vision_llm(),
            solver: default_solver_llm(),
            recognition: RecognitionConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            body_limit_bytes: default_body_limit(),
            logs: LogsConfig::default(),
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            max_age_secs: default_max_age_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_chars: default_max_chars(),
            image_delivery: ImageDelivery::default(),
        }
    }
}

fn default_vision_llm() -> LlmConfig {
    LlmConfig {
        provider: Provider::Together,
        base_url: String::new(),
        api_key: String::new(),
        model: "meta-llama/Llama-Vision-Free".to_string(),
    }
}

fn default_solver_llm() -> LlmConfig {
    LlmConfig {
        provider: Provider::OpenAi,
        base_url: String::new(),
        api_key: String::new(),
        model: "gpt-4o-mini".to_string(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_body_limit() -> usize {
    50 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_temp_dir() -> String {
    "temp".to_string()
}

fn default_max_age_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    3600
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u16 {
    100
}

fn default_max_chars() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.server.port, 5001);
        assert_eq!(config.server.public_base_url(), "http://localhost:5001");
        assert_eq!(config.server.body_limit_bytes, 50 * 1024 * 1024);
        assert_eq!(config.storage.max_age_secs, 3600);
        assert_eq!(config.recognition.max_chars, 10);
        assert_eq!(config.recognition.image_delivery, ImageDelivery::Inline);
        assert_eq!(config.vision.model, "meta-llama/Llama-Vision-Free");
        assert_eq!(config.solver.model, "gpt-4o-mini");
        assert_eq!(config.vision.api_base(), Some("https://api.together.xyz/v1"));
        assert_eq!(config.solver.api_base(), None);
    }

    #[test]
    fn test_explicit_base_url_wins_over_provider() {
        let yaml = r#"
provider: together
base_url: "http://localhost:9999/v1"
model: "llava"
"#;
        let llm: LlmConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(llm.provider, Provider::Together);
        assert_eq!(llm.api_base(), Some("http://localhost:9999/v1"));

        let llm: LlmConfig = serde_yaml::from_str("model: gpt-4o").unwrap();
        assert_eq!(llm.provider, Provider::OpenAi);
        assert_eq!(llm.api_base(), None);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
server:
  port: 8080
recognition:
  image_delivery: url
solver:
  base_url: "http://localhost:9999/v1"
  model: "gpt-4o"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.recognition.image_delivery, ImageDelivery::Url);
        assert_eq!(config.recognition.temperature, 0.1);
        assert_eq!(config.solver.provider, Provider::OpenAi);
        assert_eq!(config.solver.model, "gpt-4o");
        assert_eq!(config.vision.model, "meta-llama/Llama-Vision-Free");
        assert_eq!(config.storage.temp_dir, "temp");
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "6000"),
            ("OPENAI_API_KEY", "sk-openai"),
            ("TOGETHER_API_KEY", "tg-key"),
            ("TEMP_DIR", "/tmp/math"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 6000);
        assert_eq!(config.server.public_base_url(), "http://localhost:6000");
        assert_eq!(config.solver.api_key, "sk-openai");
        assert_eq!(config.vision.api_key, "tg-key");
        assert_eq!(config.storage.temp_dir, "/tmp/math");
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "PORT").then(|| "not-a-port".to_string()));
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn test_validation() {
        assert!(Config::default().validate().is_ok());

        let mut config = Config::default();
        config.recognition.max_chars = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_chars"));

        let mut config = Config::default();
        config.storage.sweep_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_public_url_trailing_slash() {
        let server = ServerConfig {
            public_url: Some("https://notes.example.com/".to_string()),
            ..ServerConfig::default()
        };
        assert_eq!(server.public_base_url(), "https://notes.example.com");
    }
}

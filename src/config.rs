use crate::types::{AppError, AppResult, LLMProvider};
use config::{Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "athena";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LLMConfig,
    pub agent: AgentConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Filled from the provider's conventional environment variable
    #[serde(skip)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Upper bound on model calls per stage in the tool-use loop
    pub max_iterations: usize,
    /// Fail the stage on a tool error instead of reporting it to the model
    pub fail_on_tool_error: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub max_results: usize,
    pub web_enabled: bool,
    pub arxiv_enabled: bool,
    pub pubmed_enabled: bool,
    pub arxiv_base_url: String,
    pub pubmed_base_url: String,
    #[serde(skip)]
    pub serpapi_key: String,
    #[serde(skip)]
    pub ncbi_api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Write logs to a daily rolling file here instead of stderr
    pub directory: Option<PathBuf>,
}

impl Config {
    /// Load defaults, then the optional config file, then `ATHENA_*` overrides.
    ///
    /// Credentials come from the conventional provider variables
    /// (`OPENAI_API_KEY`, `NCBI_API_KEY`, ...), `.env` included.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .set_default("llm.provider", "openai")?
            .set_default("llm.model", "gpt-4.1")?
            .set_default("llm.max_tokens", 4096_i64)?
            .set_default("llm.temperature", 0.3_f64)?
            .set_default("llm.request_timeout_secs", 120_i64)?
            .set_default("agent.max_iterations", 15_i64)?
            .set_default("agent.fail_on_tool_error", false)?
            .set_default("search.max_results", 5_i64)?
            .set_default("search.web_enabled", true)?
            .set_default("search.arxiv_enabled", true)?
            .set_default("search.pubmed_enabled", true)?
            .set_default("search.arxiv_base_url", "https://export.arxiv.org")?
            .set_default("search.pubmed_base_url", "https://eutils.ncbi.nlm.nih.gov/entrez/eutils")?
            .set_default("output.path", crate::storage::DEFAULT_OUTPUT_FILE)?
            .set_default("logging.level", "athena_research=warn")?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let mut config: Config = builder
            .add_source(
                Environment::with_prefix("ATHENA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.load_credentials();
        Ok(config)
    }

    fn load_credentials(&mut self) {
        if let Some(provider) = LLMProvider::from_id(&self.llm.provider) {
            self.llm.api_key = env::var(provider.api_key_var()).unwrap_or_default();
        }
        self.search.serpapi_key = env::var("SERPAPI_API_KEY").unwrap_or_default();
        self.search.ncbi_api_key = env::var("NCBI_API_KEY").unwrap_or_default();
    }

    /// Switch provider after loading, re-reading its credential
    pub fn set_provider(&mut self, provider: &str) {
        self.llm.provider = provider.to_string();
        self.load_credentials();
    }

    /// Startup checks; missing credentials fail here, before any model call
    pub fn validate(&self) -> AppResult<()> {
        let provider = LLMProvider::from_id(&self.llm.provider).ok_or_else(|| {
            AppError::Config(format!("Unsupported LLM provider: {}", self.llm.provider))
        })?;

        if self.llm.api_key.trim().is_empty() {
            return Err(AppError::Config(format!(
                "{} must be set for provider '{}'",
                provider.api_key_var(),
                provider
            )));
        }

        if self.search.pubmed_enabled && self.search.ncbi_api_key.trim().is_empty() {
            return Err(AppError::Config(
                "NCBI_API_KEY must be set when PubMed search is enabled \
                 (set ATHENA_SEARCH__PUBMED_ENABLED=false to disable it)"
                    .to_string(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(AppError::Config("agent.max_iterations must be at least 1".to_string()));
        }

        if self.search.max_results == 0 {
            return Err(AppError::Config("search.max_results must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl LLMConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn provider_config(&self) -> crate::llm::LLMProviderConfig {
        crate::llm::LLMProviderConfig {
            name: self.provider.clone(),
            api_key: self.api_key.clone(),
            base_url: self.base_url.clone(),
            timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests that read or write ATHENA_* variables must not overlap
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn sample_config() -> Config {
        Config {
            llm: LLMConfig {
                provider: "openai".to_string(),
                model: "gpt-4.1".to_string(),
                base_url: None,
                max_tokens: 4096,
                temperature: 0.3,
                request_timeout_secs: 120,
                api_key: "sk-test".to_string(),
            },
            agent: AgentConfig {
                max_iterations: 15,
                fail_on_tool_error: false,
            },
            search: SearchConfig {
                max_results: 5,
                web_enabled: false,
                arxiv_enabled: true,
                pubmed_enabled: true,
                arxiv_base_url: "https://export.arxiv.org".to_string(),
                pubmed_base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
                serpapi_key: String::new(),
                ncbi_api_key: "ncbi-test".to_string(),
            },
            output: OutputConfig {
                path: PathBuf::from("research_output.txt"),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: None,
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_missing_model_key_is_startup_failure() {
        let mut config = sample_config();
        config.llm.api_key.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_missing_ncbi_key_only_matters_with_pubmed() {
        let mut config = sample_config();
        config.search.ncbi_api_key.clear();
        assert!(config.validate().is_err());

        config.search.pubmed_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = sample_config();
        config.llm.provider = "glm".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = sample_config();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reads_config_file() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("athena.toml");
        std::fs::write(
            &path,
            "[llm]\nprovider = \"anthropic\"\nmodel = \"claude-sonnet-4-20250514\"\n\n[agent]\nmax_iterations = 4\n",
        )
        .unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.model, "claude-sonnet-4-20250514");
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.search.max_results, 5);
    }

    #[test]
    fn test_env_overrides_use_single_underscore_prefix() {
        let _env = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("ATHENA_AGENT__MAX_ITERATIONS", "3");
        env::set_var("ATHENA_SEARCH__PUBMED_ENABLED", "false");

        let loaded = Config::load(None);

        env::remove_var("ATHENA_AGENT__MAX_ITERATIONS");
        env::remove_var("ATHENA_SEARCH__PUBMED_ENABLED");

        let config = loaded.unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert!(!config.search.pubmed_enabled);
    }
}

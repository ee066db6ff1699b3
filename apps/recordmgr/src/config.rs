use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO Error")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse Error")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Invalid TOML error")]
    Invalid { message: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub record_manager: RecordManagerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub buffer_pages: NonZeroUsize,
    pub page_size: NonZeroUsize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordManagerConfig {
    pub max_object_size: NonZeroUsize,
    pub reservation_capacity: NonZeroUsize,
    pub strategy: StrategyConfig,
    pub translator: TranslatorKind,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyConfig {
    OneRecordPerPage,
    FirstFit,
    LastToFirstFit,
    NextFit,
    NextFitWithH { h: usize },
    BestFit { percentage_free: f64 },
    BestFitOnNEmptiestPages { n: usize },
    AppendOnly,
    AppendOnlyN { n: usize },
    Lru { n: usize },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslatorKind {
    Identity,
    Map,
}

impl StrategyConfig {
    /// Builds the runtime [`strategy::Strategy`] this configuration describes.
    pub fn build(&self) -> strategy::Strategy {
        match self {
            StrategyConfig::OneRecordPerPage => strategy::Strategy::one_record_per_page(),
            StrategyConfig::FirstFit => strategy::Strategy::first_fit(),
            StrategyConfig::LastToFirstFit => strategy::Strategy::last_to_first_fit(),
            StrategyConfig::NextFit => strategy::Strategy::next_fit(),
            StrategyConfig::NextFitWithH { h } => strategy::Strategy::next_fit_with_h(*h),
            StrategyConfig::BestFit { percentage_free } => {
                strategy::Strategy::best_fit(*percentage_free)
            }
            StrategyConfig::BestFitOnNEmptiestPages { n } => {
                strategy::Strategy::best_fit_on_n_emptiest_pages(*n)
            }
            StrategyConfig::AppendOnly => strategy::Strategy::append_only(),
            StrategyConfig::AppendOnlyN { n } => strategy::Strategy::append_only_n(*n),
            StrategyConfig::Lru { n } => strategy::Strategy::lru(*n),
        }
    }
}

impl TranslatorKind {
    pub fn build(self) -> translator::Translator {
        match self {
            TranslatorKind::Identity => translator::Translator::identity(),
            TranslatorKind::Map => translator::Translator::map(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        let cfg: EngineConfig = toml::from_str(&text).map_err(|e| ConfigError::ParseToml {
            path: path.clone(),
            source: e,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                message: "storage.data_dir must not be empty".to_string(),
            });
        }
        if self.record_manager.max_object_size.get() > self.storage.page_size.get() {
            return Err(ConfigError::Invalid {
                message: "record_manager.max_object_size must not exceed storage.page_size"
                    .to_string(),
            });
        }
        Ok(())
    }
}

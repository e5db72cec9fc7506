use std::path::{Path, PathBuf};
use tokio::fs as async_fs;
use tokio::io::AsyncWriteExt;
use reqwest::Client;
use tracing::info;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{Config, TranscriberImplementation};
use crate::error::{Result, RecutError};

const MODEL_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Known whisper.cpp ggml models and their approximate sizes in MB
const KNOWN_MODELS: &[(&str, f64)] = &[
    ("tiny", 75.0),
    ("tiny.en", 75.0),
    ("base", 142.0),
    ("base.en", 142.0),
    ("small", 466.0),
    ("small.en", 466.0),
    ("medium", 1500.0),
    ("medium.en", 1500.0),
    ("large-v2", 2900.0),
    ("large-v3", 2900.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub filename: String,
    pub url: String,
    pub size_mb: f64,
}

impl ModelInfo {
    fn from_name(name: &str, size_mb: f64) -> Self {
        let filename = format!("ggml-{}.bin", name);
        Self {
            name: name.to_string(),
            url: format!("{}/{}", MODEL_BASE_URL, filename),
            filename,
            size_mb,
        }
    }
}

/// Provisions whisper.cpp models under `<root>/models`
pub struct SetupManager {
    client: Client,
    root_dir: PathBuf,
}

impl SetupManager {
    pub fn new() -> Result<Self> {
        Self::with_root(".recut")
    }

    pub fn with_root<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();

        let client = Client::builder()
            .user_agent(concat!("recut/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, root_dir })
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root_dir.join("models")
    }

    pub fn get_available_models(&self) -> Vec<ModelInfo> {
        KNOWN_MODELS
            .iter()
            .map(|(name, size)| ModelInfo::from_name(name, *size))
            .collect()
    }

    /// Resolve the whisper.cpp model to a local file, downloading it when missing.
    /// Other transcriber implementations manage their own models.
    pub async fn initialize(&self, config: &mut Config) -> Result<()> {
        if config.transcriber.implementation != TranscriberImplementation::WhisperCpp {
            return Ok(());
        }

        let model = &config.transcriber.model;
        if Path::new(model).is_file() {
            return Ok(());
        }

        let info = self
            .get_available_models()
            .into_iter()
            .find(|m| &m.name == model)
            .ok_or_else(|| RecutError::Config(format!("Unknown whisper.cpp model: {}", model)))?;

        let local_path = self.download_model(&info).await?;
        config.transcriber.model = local_path.to_string_lossy().to_string();
        Ok(())
    }

    pub async fn download_model(&self, model: &ModelInfo) -> Result<PathBuf> {
        let local_path = self.models_dir().join(&model.filename);

        // Check if already exists
        if local_path.exists() {
            info!("Model {} already exists at {}", model.name, local_path.display());
            return Ok(local_path);
        }

        async_fs::create_dir_all(self.models_dir()).await?;
        info!("Downloading {} model ({:.1} MB)...", model.name, model.size_mb);

        let mut response = self.client.get(&model.url).send().await?;
        if !response.status().is_success() {
            return Err(RecutError::Config(format!(
                "Failed to download model {}: HTTP {}",
                model.name,
                response.status()
            )));
        }

        let total = response
            .content_length()
            .unwrap_or((model.size_mb * 1_000_000.0) as u64);
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        // Stream into a temporary file, then move into place
        let temp_path = local_path.with_extension("tmp");
        let mut file = async_fs::File::create(&temp_path).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;
        drop(file);

        async_fs::rename(&temp_path, &local_path).await?;

        pb.finish_with_message(format!("Downloaded {}", model.name));
        info!("Successfully downloaded {} to {}", model.name, local_path.display());

        Ok(local_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_urls() {
        let manager = SetupManager::with_root("/tmp/recut-test").unwrap();
        let base = manager
            .get_available_models()
            .into_iter()
            .find(|m| m.name == "base")
            .unwrap();

        assert_eq!(base.filename, "ggml-base.bin");
        assert_eq!(
            base.url,
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin"
        );
        assert_eq!(manager.models_dir(), PathBuf::from("/tmp/recut-test/models"));
    }

    #[test]
    fn test_initialize_skips_openai_backend() {
        let manager = SetupManager::with_root("/nonexistent").unwrap();
        let mut config = Config::default();
        tokio_test::block_on(manager.initialize(&mut config)).unwrap();
        assert_eq!(config.transcriber.model, "base");
    }

    #[tokio::test]
    async fn test_initialize_uses_existing_model_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("models").join("ggml-base.bin");
        std::fs::create_dir_all(model_path.parent().unwrap()).unwrap();
        std::fs::write(&model_path, b"ggml").unwrap();

        let manager = SetupManager::with_root(dir.path()).unwrap();
        let mut config = Config::default();
        config.transcriber.implementation = TranscriberImplementation::WhisperCpp;

        manager.initialize(&mut config).await.unwrap();
        assert_eq!(PathBuf::from(&config.transcriber.model), model_path);
    }

    #[tokio::test]
    async fn test_initialize_rejects_unknown_model() {
        let manager = SetupManager::with_root("/nonexistent").unwrap();
        let mut config = Config::default();
        config.transcriber.implementation = TranscriberImplementation::WhisperCpp;
        config.transcriber.model = "gigantic".to_string();

        let result = manager.initialize(&mut config).await;
        assert!(matches!(result, Err(RecutError::Config(_))));
    }
}

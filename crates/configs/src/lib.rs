use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Where the product catalog lives on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_products_file")]
    pub products_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), products_file: default_products_file() }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_products_file() -> String { "products.json".into() }

/// `CONFIG_PATH`, or `config.toml` in the working directory.
pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Read a TOML config file. `Ok(None)` only when the file does not exist;
/// read and parse failures are errors.
pub fn load_from_file(path: &str) -> Result<Option<AppConfig>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(anyhow!("cannot read {path}: {e}")),
    };
    load_from_str(&content)
        .map(Some)
        .map_err(|e| anyhow!("invalid config {path}: {e}"))
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Config file at `config_path()`; env vars only when that file is missing.
    pub fn load_or_env() -> Result<Self> {
        Self::load_or_env_from(&config_path())
    }

    pub fn load_or_env_from(path: &str) -> Result<Self> {
        let mut cfg = match load_from_file(path)? {
            Some(cfg) => cfg,
            None => Self::from_env(),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Build from `SERVER_HOST`, `SERVER_PORT`, `TOKIO_WORKER_THREADS`,
    /// `DATA_DIR` and `PRODUCTS_FILE`, defaulting anything unset.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.server.worker_threads = std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok());
        if let Ok(dir) = std::env::var("DATA_DIR") {
            cfg.storage.data_dir = dir;
        }
        if let Ok(file) = std::env::var("PRODUCTS_FILE") {
            cfg.storage.products_file = file;
        }
        cfg
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        // 归一化 server
        self.server.normalize()?;
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.products_file.trim().is_empty() {
            return Err(anyhow!("storage.products_file must not be empty"));
        }
        Ok(())
    }

    /// Full path of the backing JSON file.
    pub fn products_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.products_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.server.bind_addr(), "127.0.0.1:8080");
        assert_eq!(cfg.storage.products_path(), PathBuf::from("data").join("products.json"));
    }

    #[test]
    fn parses_toml_with_partial_sections() -> Result<()> {
        let cfg = load_from_str(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9090

            [storage]
            products_file = "catalog.json"
            "#,
        )?;
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.worker_threads, None);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.storage.products_file, "catalog.json");
        Ok(())
    }

    #[test]
    fn normalize_fills_blank_host_and_worker_threads() -> Result<()> {
        let mut cfg = AppConfig::default();
        cfg.server.host = "  ".into();
        cfg.server.worker_threads = Some(0);
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.worker_threads, Some(4));
        Ok(())
    }

    fn tmp_config(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("catalog_config_{tag}_{}.toml", uuid::Uuid::new_v4()))
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(load_from_str("[storage\nproducts_file = ").is_err());
        assert!(load_from_str("[server]\nport = \"eighty\"").is_err());
    }

    #[test]
    fn existing_but_malformed_file_does_not_fall_back_to_env() -> Result<()> {
        let path = tmp_config("broken");
        std::fs::write(&path, "[storage]\nproducts_file = catalog.json\n")?;
        let path_str = path.to_string_lossy().into_owned();

        let res = AppConfig::load_or_env_from(&path_str);
        let msg = res.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(msg.starts_with("invalid config"), "{msg}");

        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn missing_file_reads_as_none() -> Result<()> {
        let path = tmp_config("missing");
        assert!(load_from_file(&path.to_string_lossy())?.is_none());
        Ok(())
    }

    #[test]
    fn valid_file_is_used() -> Result<()> {
        let path = tmp_config("valid");
        std::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = 9191\n")?;

        let cfg = AppConfig::load_or_env_from(&path.to_string_lossy())?;
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:9191");
        assert_eq!(cfg.server.worker_threads, Some(4));

        let _ = std::fs::remove_file(&path);
        Ok(())
    }

    #[test]
    fn rejects_zero_port_and_blank_storage() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.storage.products_file = "".into();
        assert!(cfg.normalize_and_validate().is_err());
    }
}

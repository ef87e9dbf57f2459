//! ステージ設定
//!
//! ステージは稼働中の Gilliam 環境を表し、全フォーメーションで共有されます。
//! 通常 `~/.gilliam/stage/<name>` に YAML で保存されます。
//!
//! ほとんどの値は環境変数で上書きできます。例えば `repository` は
//! `GILLIAM_REPOSITORY` で上書きされます。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// スケジューラ API のデフォルトのベース URL
pub const DEFAULT_SCHEDULER_URL: &str = "http://api.scheduler.service";

/// ルーター API のデフォルトのベース URL
pub const DEFAULT_ROUTER_URL: &str = "http://api.router.service";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// イメージを置くリポジトリ（例: `registry.example.com/acme`）
    #[serde(default)]
    pub repository: Option<String>,

    /// サービスレジストリのノード一覧（`host:port`）
    #[serde(default)]
    pub service_registry: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduler: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router: Option<String>,
}

impl StageConfig {
    /// ファイルから読み込み、環境変数で上書きして検証する
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StageRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config: StageConfig =
            serde_yaml::from_str::<Option<StageConfig>>(&content)
                .map_err(|e| ConfigError::StageRead {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
                .unwrap_or_default();

        config.set_defaults();
        config.override_from_environment();
        config.check()?;
        tracing::debug!(path = %path.display(), "Loaded stage config");
        Ok(config)
    }

    /// デフォルト値と環境変数だけで構成する
    pub fn from_env() -> Result<Self> {
        let mut config = StageConfig::default();
        config.set_defaults();
        config.override_from_environment();
        config.check()?;
        Ok(config)
    }

    /// ステージ設定を保存
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    fn set_defaults(&mut self) {
        if self.repository.is_none() {
            self.repository = Some(current_user());
        }
    }

    fn override_from_environment(&mut self) {
        if let Ok(repository) = std::env::var("GILLIAM_REPOSITORY") {
            self.repository = Some(repository);
        }
        if let Ok(nodes) = std::env::var("GILLIAM_SERVICE_REGISTRY") {
            self.service_registry = nodes
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Ok(url) = std::env::var("GILLIAM_SCHEDULER") {
            self.scheduler = Some(url);
        }
        if let Ok(url) = std::env::var("GILLIAM_ROUTER") {
            self.router = Some(url);
        }
    }

    fn check(&self) -> Result<()> {
        if self.service_registry.is_empty() {
            return Err(ConfigError::MissingServiceRegistry);
        }
        Ok(())
    }

    pub fn repository(&self) -> &str {
        self.repository.as_deref().unwrap_or("")
    }

    pub fn scheduler_url(&self) -> &str {
        self.scheduler.as_deref().unwrap_or(DEFAULT_SCHEDULER_URL)
    }

    pub fn router_url(&self) -> &str {
        self.router.as_deref().unwrap_or(DEFAULT_ROUTER_URL)
    }
}

/// 実行ユーザー名
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

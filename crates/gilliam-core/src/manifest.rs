//! プロジェクトマニフェストとリリースマニフェスト

use crate::discovery::MANIFEST_FILE;
use crate::error::{CoreError, Result};
use crate::model::{CommandSpec, ServiceDescriptor, deserialize_env, deserialize_ports};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// `gilliam.yml` の1サービス分の定義
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceDefinition {
    /// 明示的なサービス種別
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    /// ソースディレクトリ（プロジェクトルートからの相対パス）
    #[serde(default)]
    pub approot: Option<String>,

    #[serde(default)]
    pub script: Option<CommandSpec>,

    #[serde(default)]
    pub command: Option<CommandSpec>,

    #[serde(default, deserialize_with = "deserialize_ports")]
    pub ports: Vec<String>,

    #[serde(default, deserialize_with = "deserialize_env")]
    pub env: BTreeMap<String, String>,
}

impl ServiceDefinition {
    /// 実行コマンド（`script` が `command` より優先）
    pub fn command_args(&self) -> Option<Vec<String>> {
        self.script
            .clone()
            .or_else(|| self.command.clone())
            .map(CommandSpec::into_args)
    }

    pub fn approot(&self) -> &str {
        self.approot.as_deref().unwrap_or(".")
    }
}

/// プロジェクトルートの `gilliam.yml`
#[derive(Debug, Clone)]
pub struct ProjectManifest {
    pub root: PathBuf,
    pub services: BTreeMap<String, ServiceDefinition>,
}

impl ProjectManifest {
    /// ディレクトリ `dir` にあるマニフェストを読み込む
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CoreError::ProjectRootNotFound(dir.to_path_buf()),
            _ => CoreError::Io(e),
        })?;
        let services = Self::parse(&content).map_err(|e| CoreError::ManifestParse {
            path: path.clone(),
            message: e.to_string(),
        })?;

        tracing::debug!(path = %path.display(), services = services.len(), "Loaded project manifest");
        Ok(Self {
            root: dir.to_path_buf(),
            services,
        })
    }

    fn parse(content: &str) -> std::result::Result<BTreeMap<String, ServiceDefinition>, serde_yaml::Error> {
        // 空ファイルはサービスなしとして扱う
        let services: Option<BTreeMap<String, ServiceDefinition>> = serde_yaml::from_str(content)?;
        Ok(services.unwrap_or_default())
    }
}

/// `launch` で読み込むリリースマニフェスト（YAML または JSON）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseManifest {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDescriptor>,
}

impl ReleaseManifest {
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| CoreError::ManifestParse {
            path: PathBuf::from("<release manifest>"),
            message: e.to_string(),
        })
    }
}

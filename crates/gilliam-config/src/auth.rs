//! レジストリ認証情報のキャッシュ
//!
//! `~/.gilliam/auth` にレジストリ名をキーとした YAML で保存し、
//! 所有者のみ読み書き可能なパーミッション (0600) を付けます。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthCache {
    path: PathBuf,
    credentials: BTreeMap<String, Credentials>,
}

impl AuthCache {
    /// キャッシュを読み込む（ファイルがなければ空）
    pub fn load(path: &Path) -> Result<Self> {
        let credentials = match std::fs::read_to_string(path) {
            Ok(content) => serde_yaml::from_str::<Option<BTreeMap<String, Credentials>>>(&content)
                .map_err(|e| ConfigError::AuthParse {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?
                .unwrap_or_default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            credentials,
        })
    }

    pub fn get(&self, registry: &str) -> Option<&Credentials> {
        self.credentials.get(registry)
    }

    pub fn store(&mut self, registry: &str, credentials: Credentials) {
        self.credentials.insert(registry.to_string(), credentials);
    }

    pub fn remove(&mut self, registry: &str) -> Option<Credentials> {
        self.credentials.remove(registry)
    }

    pub fn registries(&self) -> impl Iterator<Item = &str> {
        self.credentials.keys().map(String::as_str)
    }

    /// キャッシュを書き出す
    pub fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_yaml::to_string(&self.credentials)?)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %self.path.display(), "Wrote auth cache");
        Ok(())
    }

    /// `f` でキャッシュを更新し、成否にかかわらず書き出す
    ///
    /// `f` のエラーは書き出しのエラーより優先されます。
    pub fn update<F, T, E>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
        E: From<ConfigError>,
    {
        let outcome = f(self);
        let written = self.write();
        let value = outcome?;
        written?;
        Ok(value)
    }
}

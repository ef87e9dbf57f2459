//! フォーメーション設定
//!
//! プロジェクトルート直下の `.gilliam/` に、現在のステージとフォーメーション名を
//! それぞれテキストファイルとして保存します。

use crate::error::Result;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".gilliam";

#[derive(Debug, Clone)]
pub struct FormationConfig {
    rootdir: PathBuf,
}

impl FormationConfig {
    pub fn new(rootdir: impl Into<PathBuf>) -> Self {
        Self {
            rootdir: rootdir.into(),
        }
    }

    pub fn rootdir(&self) -> &Path {
        &self.rootdir
    }

    /// 現在のステージ名（未設定なら `None`）
    pub fn stage(&self) -> Result<Option<String>> {
        self.read("stage")
    }

    pub fn set_stage(&self, stage: &str) -> Result<()> {
        self.write("stage", stage)
    }

    /// 現在のフォーメーション名（未設定なら `None`）
    pub fn formation(&self) -> Result<Option<String>> {
        self.read("formation")
    }

    pub fn set_formation(&self, formation: &str) -> Result<()> {
        self.write("formation", formation)
    }

    /// `.gilliam/ignore` のパス
    pub fn ignore_file(&self) -> PathBuf {
        self.rootdir.join(CONFIG_DIR).join("ignore")
    }

    fn read(&self, name: &str) -> Result<Option<String>> {
        let path = self.rootdir.join(CONFIG_DIR).join(name);
        match std::fs::read_to_string(&path) {
            Ok(value) => {
                let value = value.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, value: &str) -> Result<()> {
        let dir = self.rootdir.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(name), value)?;
        tracing::debug!(key = name, value, "Updated formation config");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unset_values_are_none() {
        let dir = tempdir().unwrap();
        let config = FormationConfig::new(dir.path());
        assert_eq!(config.stage().unwrap(), None);
        assert_eq!(config.formation().unwrap(), None);
    }

    #[test]
    fn test_set_and_read_back() {
        let dir = tempdir().unwrap();
        let config = FormationConfig::new(dir.path());
        config.set_stage("prod").unwrap();
        config.set_formation("shop").unwrap();

        assert!(dir.path().join(".gilliam").is_dir());
        assert_eq!(config.stage().unwrap().as_deref(), Some("prod"));
        assert_eq!(config.formation().unwrap().as_deref(), Some("shop"));
    }

    #[test]
    fn test_trailing_newline_ignored() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".gilliam")).unwrap();
        std::fs::write(dir.path().join(".gilliam/formation"), "shop\n").unwrap();
        let config = FormationConfig::new(dir.path());
        assert_eq!(config.formation().unwrap().as_deref(), Some("shop"));
    }
}

//! プロジェクトルートの検出

use crate::error::{CoreError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// プロジェクトマニフェストのファイル名
pub const MANIFEST_FILE: &str = "gilliam.yml";

/// プロジェクトルートを検出
///
/// 以下の優先順位で検索:
/// 1. 環境変数 GILLIAM_PROJECT_ROOT
/// 2. カレントディレクトリから上に向かって gilliam.yml を探す
#[tracing::instrument]
pub fn find_project_root() -> Result<PathBuf> {
    if let Ok(root) = std::env::var("GILLIAM_PROJECT_ROOT") {
        let path = PathBuf::from(&root);
        debug!(env_root = %root, "Checking GILLIAM_PROJECT_ROOT");
        if path.join(MANIFEST_FILE).exists() {
            info!(project_root = %path.display(), "Found project root from environment variable");
            return Ok(path);
        }
    }

    let start_dir = std::env::current_dir()?;
    find_project_root_from(&start_dir)
}

/// `start` から親ディレクトリへ向かって gilliam.yml を探す
pub fn find_project_root_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(MANIFEST_FILE).exists() {
            debug!(project_root = %current.display(), "Found project root");
            return Ok(current);
        }
        if !current.pop() {
            break;
        }
    }

    Err(CoreError::ProjectRootNotFound(start.to_path_buf()))
}

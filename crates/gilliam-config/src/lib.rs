//! Gilliam configuration
//!
//! 設定は2階層あります:
//!
//! - *グローバル* 設定 (`~/.gilliam`): ステージ（稼働中の Gilliam 環境）ごとの
//!   設定と、レジストリ認証情報のキャッシュ
//! - *フォーメーション* 設定 (`<project>/.gilliam`): 現在のフォーメーションと
//!   ステージを指すテキストファイル
//!
//! 構造化データは YAML、単一の値はただのテキストとして保存します。

pub mod auth;
pub mod error;
pub mod formation;
pub mod stage;

pub use auth::{AuthCache, Credentials};
pub use error::{ConfigError, Result};
pub use formation::FormationConfig;
pub use stage::StageConfig;

use std::path::PathBuf;

/// グローバル設定ディレクトリ (`~/.gilliam`、`GILLIAM_HOME` で上書き可)
pub fn get_config_dir() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("GILLIAM_HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(".gilliam"))
        .ok_or(ConfigError::HomeDirNotFound)
}

/// 認証キャッシュのパス
pub fn auth_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("auth"))
}

/// ステージ設定のパス
pub fn stage_path(stage: &str) -> Result<PathBuf> {
    Ok(get_config_dir()?.join("stage").join(stage))
}

//! Gilliam core
//!
//! リリース・サービス記述子・ポート指定などのデータモデルと、
//! プロジェクトマニフェスト (`gilliam.yml`) の読み込みを提供します。

pub mod discovery;
pub mod error;
pub mod manifest;
pub mod model;

pub use discovery::{MANIFEST_FILE, find_project_root, find_project_root_from};
pub use error::{CoreError, Result};
pub use manifest::{ProjectManifest, ReleaseManifest, ServiceDefinition};
pub use model::*;

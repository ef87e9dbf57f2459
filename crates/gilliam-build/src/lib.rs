//! Gilliam build and release workflow
//!
//! プロジェクトの各サービスをビルドし、リリースを作成して、
//! マイグレーション・スケールを完了まで進めます。
//!
//! - [`service`]: サービス種別の検出とビルド
//! - [`tag`] / [`context`]: ソースツリーからのタグとビルドコンテキスト
//! - [`release`]: 競合時に再試行するリリース作成
//! - [`rollout`]: マイグレーション・スケールのポーリング

pub mod auth;
pub mod context;
pub mod custom;
pub mod error;
pub mod ignore;
pub mod progress;
pub mod release;
pub mod rollout;
pub mod service;
pub mod tag;
pub mod tree;

#[cfg(test)]
mod fakes;

pub use auth::check_credentials;
pub use context::ContextBuilder;
pub use custom::{CustomService, LOG_PREFIX, LogRelay};
pub use error::{BuildError, Result};
pub use ignore::{IGNORE_FILE, IgnoreSet};
pub use progress::PushProgress;
pub use release::{ReleaseOptions, build_services, create_release, current_release, merge_releases};
pub use rollout::{RATE_INTERVAL, parse_rate};
pub use service::{
    BuildOptions, DETECTION_ORDER, DetectionRule, PREBUILT_IMAGES, PrebuiltImage, PrebuiltService,
    Service, VARIANTS, create_services, detect,
};
pub use tag::compute_tag;
pub use tree::{SourceDir, SourceTree};

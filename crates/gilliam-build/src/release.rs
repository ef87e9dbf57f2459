//! リリースの作成
//!
//! 全サービスをビルド・プッシュしてから、最新リリースの環境変数とマージして
//! 新しいリリースを作成します。リリース名はスケジューラ側で一意性が
//! 保証されるため、競合（409）したら最新リリースの取得からやり直します。

use crate::error::{BuildError, Result};
use crate::service::{BuildOptions, Service};
use gilliam_api::Scheduler;
use gilliam_core::{Release, ServiceDescriptor, latest_release, next_release_name};
use std::collections::BTreeMap;

/// リリース作成のオプション
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    pub author: String,
    pub message: Option<String>,
    /// 以前のリリースの環境変数を引き継がない
    pub override_env: bool,
    /// 競合時の最大試行回数（`None` は無制限）
    pub max_attempts: Option<u32>,
}

/// 全サービスをビルドし、その後で全サービスをコミットする
pub async fn build_services(
    services: &mut BTreeMap<String, Service>,
    options: &BuildOptions<'_>,
) -> Result<BTreeMap<String, ServiceDescriptor>> {
    let mut built = BTreeMap::new();
    for (name, service) in services.iter_mut() {
        built.insert(name.clone(), service.build(options).await?);
    }
    for service in services.values() {
        service.commit(options).await?;
    }
    Ok(built)
}

/// ビルド結果を現在のリリースとマージ
///
/// 同名サービスの環境変数は新しい値を優先し、古い側にしかないキーは
/// 持ち越します。現在のリリースにないサービスはそのまま使います。
pub fn merge_releases(
    current: Option<&Release>,
    built: &BTreeMap<String, ServiceDescriptor>,
) -> BTreeMap<String, ServiceDescriptor> {
    let mut merged = built.clone();
    if let Some(current) = current {
        for (name, descriptor) in merged.iter_mut() {
            if let Some(previous) = current.services.get(name) {
                descriptor.inherit_env(previous);
            }
        }
    }
    merged
}

/// フォーメーションの最新リリース（なければ `None`）
pub async fn current_release(scheduler: &dyn Scheduler, formation: &str) -> Result<Option<Release>> {
    Ok(latest_release(scheduler.releases(formation).await?))
}

/// ビルド済みのサービスから新しいリリースを作成し、その名前を返す
pub async fn create_release(
    scheduler: &dyn Scheduler,
    formation: &str,
    built: &BTreeMap<String, ServiceDescriptor>,
    options: &ReleaseOptions,
) -> Result<String> {
    let mut attempts = 0u32;
    loop {
        attempts += 1;

        let current = current_release(scheduler, formation).await?;
        let services = if options.override_env {
            built.clone()
        } else {
            merge_releases(current.as_ref(), built)
        };
        let release = Release {
            name: next_release_name(current.as_ref())?,
            author: Some(options.author.clone()),
            message: options.message.clone(),
            services,
        };

        match scheduler.create_release(formation, &release).await {
            Ok(created) => {
                tracing::debug!(formation, release = %created.name, attempts, "Created release");
                return Ok(created.name);
            }
            Err(e) if e.is_conflict() => {
                tracing::debug!(formation, release = %release.name, "Release name taken; retrying");
                if options.max_attempts.is_some_and(|max| attempts >= max) {
                    return Err(BuildError::ConflictRetriesExhausted { attempts });
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// サービスをビルドしてリリースを作成
pub async fn release(
    scheduler: &dyn Scheduler,
    services: &mut BTreeMap<String, Service>,
    build_options: &BuildOptions<'_>,
    options: &ReleaseOptions,
) -> Result<String> {
    let built = build_services(services, build_options).await?;
    create_release(scheduler, build_options.formation, &built, options).await
}

pub mod auth;
pub mod create;
pub mod launch;
pub mod migrate;
pub mod ps;
pub mod release;
pub mod releases;
pub mod route;
pub mod run;
pub mod spawn;

use gilliam_api::Scheduler;
use gilliam_core::{Release, latest_release};

/// 名前でリリースを探す（`None` なら最新）
pub async fn find_release(
    scheduler: &dyn Scheduler,
    formation: &str,
    name: Option<&str>,
) -> anyhow::Result<Option<Release>> {
    let releases = scheduler.releases(formation).await?;
    Ok(match name {
        Some(name) => releases.into_iter().find(|release| release.name == name),
        None => latest_release(releases),
    })
}

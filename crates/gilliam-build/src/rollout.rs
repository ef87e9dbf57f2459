//! マイグレーションとスケールの進行
//!
//! スケジューラは1回の呼び出しで少しずつ作業を進め、まだ作業が残って
//! いるかを返します。残っている間、一定間隔を空けて呼び続けます。
//! 呼び出し回数に上限はありません。

use crate::error::Result;
use gilliam_api::Scheduler;
use gilliam_core::ScaleMap;
use std::future::Future;
use std::time::Duration;

/// `--rate` 指定時の呼び出し間隔
pub const RATE_INTERVAL: Duration = Duration::from_secs(10);

/// `--rate` の値から呼び出し間隔を決める（指定なし・空なら待たない）
pub fn parse_rate(rate: Option<&str>) -> Duration {
    match rate {
        Some(rate) if !rate.is_empty() => RATE_INTERVAL,
        _ => Duration::ZERO,
    }
}

async fn drive<F, Fut>(mut step: F, interval: Duration) -> Result<u32>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = gilliam_api::Result<bool>>,
{
    let mut calls = 0u32;
    loop {
        calls += 1;
        if !step().await? {
            return Ok(calls);
        }
        tracing::debug!(step = calls, "More work pending");
        tokio::time::sleep(interval).await;
    }
}

/// `release` へのマイグレーションが終わるまで進める
pub async fn migrate(
    scheduler: &dyn Scheduler,
    formation: &str,
    release: &str,
    interval: Duration,
) -> Result<()> {
    tracing::info!(formation, release, "Migrating");
    let calls = drive(|| scheduler.migrate(formation, release), interval).await?;
    tracing::debug!(formation, release, calls, "Migration complete");
    Ok(())
}

/// `release` のスケール変更が終わるまで進める
pub async fn scale(
    scheduler: &dyn Scheduler,
    formation: &str,
    release: &str,
    scales: &ScaleMap,
    interval: Duration,
) -> Result<()> {
    tracing::info!(formation, release, "Scaling");
    let calls = drive(|| scheduler.scale(formation, release, scales), interval).await?;
    tracing::debug!(formation, release, calls, "Scaling complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use crate::fakes::FakeScheduler;
    use async_trait::async_trait;
    use gilliam_api::{ApiError, Result as ApiResult};
    use gilliam_core::Release;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate(None), Duration::ZERO);
        assert_eq!(parse_rate(Some("")), Duration::ZERO);
        assert_eq!(parse_rate(Some("1")), RATE_INTERVAL);
        assert_eq!(parse_rate(Some("slow")), RATE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_migrate_polls_until_done() {
        let scheduler = FakeScheduler::default();
        *scheduler.pending_steps.lock().unwrap() = 3;

        let start = tokio::time::Instant::now();
        migrate(&scheduler, "demo", "4", RATE_INTERVAL).await.unwrap();
        let elapsed = start.elapsed();

        let calls = scheduler.migrate_calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|(f, r)| f == "demo" && r == "4"));
        assert!(elapsed >= RATE_INTERVAL * 3);
        assert!(elapsed < RATE_INTERVAL * 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_migrate_done_immediately() {
        let scheduler = FakeScheduler::default();
        let start = tokio::time::Instant::now();
        migrate(&scheduler, "demo", "1", RATE_INTERVAL).await.unwrap();
        assert_eq!(scheduler.migrate_calls.lock().unwrap().len(), 1);
        assert!(start.elapsed() < RATE_INTERVAL);
    }

    #[tokio::test]
    async fn test_scale_without_rate() {
        let scheduler = FakeScheduler::default();
        *scheduler.pending_steps.lock().unwrap() = 2;
        let scales = ScaleMap::from([("web".to_string(), 3)]);

        scale(&scheduler, "demo", "2", &scales, parse_rate(None))
            .await
            .unwrap();

        let calls = scheduler.scale_calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0]["web"], 3);
    }

    struct BrokenScheduler;

    #[async_trait]
    impl Scheduler for BrokenScheduler {
        async fn releases(&self, _: &str) -> ApiResult<Vec<Release>> {
            Ok(Vec::new())
        }
        async fn create_release(&self, _: &str, release: &Release) -> ApiResult<Release> {
            Ok(release.clone())
        }
        async fn migrate(&self, _: &str, _: &str) -> ApiResult<bool> {
            Err(ApiError::Http {
                status: 500,
                message: "boom".into(),
            })
        }
        async fn scale(&self, _: &str, _: &str, _: &ScaleMap) -> ApiResult<bool> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_step_error_aborts() {
        let err = migrate(&BrokenScheduler, "demo", "1", RATE_INTERVAL)
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Api(ApiError::Http { status: 500, .. })));
    }
}

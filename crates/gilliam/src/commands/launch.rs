//! リリースマニフェストからの立ち上げ

use crate::context::Context;
use anyhow::{Context as _, anyhow};
use colored::Colorize;
use gilliam_api::Scheduler;
use gilliam_build::rollout;
use gilliam_core::{Release, ReleaseManifest, ScaleMap};
use std::io::Read;
use std::time::Duration;

const INITIAL_RELEASE_NAME: &str = "1";

/// マニフェストを読み込む（ファイル、`-` は標準入力、http(s) URL）
async fn read_manifest(source: &str) -> anyhow::Result<ReleaseManifest> {
    let content = if source.starts_with("http://") || source.starts_with("https://") {
        reqwest::get(source)
            .await?
            .error_for_status()?
            .text()
            .await
            .with_context(|| format!("{source}: cannot fetch manifest"))?
    } else if source == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        content
    } else {
        std::fs::read_to_string(source).with_context(|| format!("{source}: cannot read manifest"))?
    };
    Ok(ReleaseManifest::parse(&content)?)
}

pub async fn handle(ctx: &Context, source: &str, create: bool, scale: bool) -> anyhow::Result<()> {
    let formation = ctx.require_formation()?;
    let manifest = read_manifest(source).await?;

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;

    if create {
        scheduler.create_formation(formation).await.map_err(|e| {
            if e.is_conflict() {
                anyhow!("{formation}: formation already exists")
            } else {
                e.into()
            }
        })?;
        if !ctx.quiet {
            println!("{} {}", "created formation".green(), formation.cyan());
        }
        return Ok(());
    }

    let release = Release {
        name: INITIAL_RELEASE_NAME.to_string(),
        author: Some(manifest.author.unwrap_or_else(|| "unknown".to_string())),
        message: Some(manifest.message.unwrap_or_default()),
        services: manifest.services,
    };
    let created = scheduler.create_release(formation, &release).await?;
    if !ctx.quiet {
        println!("{} {}", "created release".green(), created.name.cyan());
    }

    if scale {
        let scales: ScaleMap = release.services.keys().map(|name| (name.clone(), 1)).collect();
        rollout::scale(&scheduler, formation, &created.name, &scales, Duration::ZERO).await?;
    }
    Ok(())
}

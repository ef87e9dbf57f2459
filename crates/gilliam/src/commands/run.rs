//! エグゼキュータ上でのコマンド実行
//!
//! ```text
//! gilliam run gilliam/base /bin/bash
//! gilliam run -s web -e DEBUG=1 -- ./manage.py shell
//! ```
//!
//! `-s` を付けると IMAGE はサービス名として扱われ、リリース（省略時は
//! 最新）からイメージ・コマンド・環境変数を引き継ぎます。

use super::find_release;
use crate::context::Context;
use anyhow::{Context as _, anyhow};
use gilliam_api::{ExecutorClient, ProcessHandle, RunRequest};
use gilliam_core::{ReleaseManifest, ServiceDescriptor};
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::time::Duration;

/// コンテナ終了後に残りの出力を待つ時間
const DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub executor: Option<String>,
    pub service: bool,
    pub release: Option<String>,
    pub env: Vec<String>,
    pub tty: bool,
    pub image: String,
    pub command: Vec<String>,
}

/// `-r` が数値ならスケジューラから、そうでなければマニフェストファイルから
async fn release_services(
    ctx: &Context,
    release: Option<&str>,
) -> anyhow::Result<(String, BTreeMap<String, ServiceDescriptor>)> {
    if let Some(path) = release.filter(|name| name.parse::<u64>().is_err()) {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("{path}: cannot read release manifest"))?;
        return Ok((path.to_string(), ReleaseManifest::parse(&content)?.services));
    }

    let formation = ctx
        .formation
        .as_deref()
        .ok_or_else(|| anyhow!("require formation"))?;
    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;

    let mut found = find_release(&scheduler, formation, release).await?;
    if found.is_none() && release.is_some() {
        found = find_release(&scheduler, formation, None).await?;
    }
    let found = found.ok_or_else(|| anyhow!("no release in formation"))?;
    Ok((found.name, found.services))
}

/// `VAR=VALUE` はそのまま、`VAR` は現在の環境から
fn make_env(vars: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut env = BTreeMap::new();
    for var in vars {
        let (name, value) = match var.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => {
                let value = std::env::var(var).map_err(|_| anyhow!("env variable {var} not set"))?;
                (var.clone(), value)
            }
        };
        env.insert(name, value);
    }
    Ok(env)
}

async fn resize_to_terminal(process: &ProcessHandle) {
    match crossterm::terminal::size() {
        Ok((width, height)) => {
            if let Err(e) = process.resize_tty(width, height).await {
                tracing::warn!(error = %e, "Failed to resize TTY");
            }
        }
        Err(e) => tracing::debug!(error = %e, "Cannot read terminal size"),
    }
}

/// コマンドを実行し、リモートの終了コードを返す
pub async fn handle(ctx: &Context, mut options: RunOptions) -> anyhow::Result<i32> {
    let mut env = BTreeMap::new();

    if options.service {
        let (name, services) = release_services(ctx, options.release.as_deref()).await?;
        let service = services
            .get(&options.image)
            .ok_or_else(|| anyhow!("no such service in release {name}"))?;
        options.image = service.image.clone();
        if options.command.is_empty() {
            options.command = service.command.clone().unwrap_or_default();
        }
        env.extend(service.env.clone());
    }
    env.extend(make_env(&options.env)?);

    let stage = ctx.stage_config()?;
    let endpoint = ctx
        .service_registry(&stage)
        .select_executor(options.executor.as_deref())
        .await?;
    tracing::debug!(executor = %endpoint.instance, host = %endpoint.host, "Selected executor");
    let executor = ExecutorClient::new(&endpoint.base_url())?;

    let interactive = std::io::stdin().is_terminal();
    let request = RunRequest {
        formation: ctx.formation.clone(),
        image: options.image,
        env,
        command: (!options.command.is_empty()).then_some(options.command),
        tty: interactive || options.tty,
    };

    let process = executor.run(&request).await?;
    process.wait_for_state("running").await?;
    if interactive {
        resize_to_terminal(&process).await;
    }

    let attached = process.clone();
    let attach = tokio::spawn(async move {
        attached
            .attach(tokio::io::stdin(), tokio::io::stdout(), interactive)
            .await
    });

    let exit_code = process.wait().await?;
    match tokio::time::timeout(DRAIN_TIMEOUT, attach).await {
        Ok(Ok(Err(e))) => tracing::debug!(error = %e, "Attach ended with error"),
        Ok(_) => {}
        Err(_) => tracing::debug!(container = process.id(), "Stopped waiting for output"),
    }
    Ok(exit_code)
}

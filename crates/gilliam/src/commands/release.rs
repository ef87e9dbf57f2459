//! release / deploy コマンド

use crate::ReleaseArgs;
use crate::context::Context;
use colored::Colorize;
use gilliam_api::DockerAuth;
use gilliam_build::release::release;
use gilliam_build::rollout;
use gilliam_build::{BuildOptions, ReleaseOptions, create_services, parse_rate};
use gilliam_config::stage::current_user;
use gilliam_core::ProjectManifest;

/// サービスをビルドしてリリースを作成し、その名前を返す
async fn build_release(ctx: &Context, args: &ReleaseArgs) -> anyhow::Result<String> {
    let project_root = ctx.require_project_root()?;
    let formation = ctx.require_formation()?;

    // ネットワークに触れる前に設定エラーを検出する
    let manifest = ProjectManifest::load(project_root)?;
    let mut services = create_services(&manifest.services)?;

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;
    let workers = ctx.service_registry(&stage);
    let registry_auth = DockerAuth::new();
    let auth_cache = ctx.auth_cache()?;

    let build_options = BuildOptions {
        project_root,
        formation,
        repository: stage.repository(),
        workers: &workers,
        registry_auth: &registry_auth,
        auth_cache: &auth_cache,
        push_images: !args.no_push,
    };
    let options = ReleaseOptions {
        author: args.author.clone().unwrap_or_else(current_user),
        message: args.message.clone(),
        override_env: args.override_env,
        max_attempts: args.max_attempts,
    };

    let name = release(&scheduler, &mut services, &build_options, &options).await?;
    if ctx.quiet {
        println!("{name}");
    } else {
        println!("{} {}", "released".green().bold(), name.cyan());
    }
    Ok(name)
}

pub async fn handle(ctx: &Context, args: &ReleaseArgs) -> anyhow::Result<String> {
    build_release(ctx, args).await
}

/// リリースを作成してそのリリースへマイグレーション
pub async fn deploy(ctx: &Context, args: &ReleaseArgs, rate: Option<&str>) -> anyhow::Result<()> {
    let interval = parse_rate(rate);
    let name = build_release(ctx, args).await?;

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;
    rollout::migrate(&scheduler, ctx.require_formation()?, &name, interval).await?;
    Ok(())
}

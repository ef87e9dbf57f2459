use crate::context::Context;
use gilliam_build::{parse_rate, rollout};
use gilliam_core::parse_scale;

pub async fn migrate(ctx: &Context, release: &str, rate: Option<&str>) -> anyhow::Result<()> {
    let formation = ctx.require_formation()?;
    let interval = parse_rate(rate);

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;
    rollout::migrate(&scheduler, formation, release, interval).await?;
    Ok(())
}

pub async fn scale(
    ctx: &Context,
    release: &str,
    specs: &[String],
    rate: Option<&str>,
) -> anyhow::Result<()> {
    let formation = ctx.require_formation()?;
    let scales = parse_scale(specs)?;
    let interval = parse_rate(rate);

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;
    rollout::scale(&scheduler, formation, release, &scales, interval).await?;
    Ok(())
}

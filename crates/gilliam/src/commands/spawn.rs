use super::find_release;
use crate::context::Context;
use anyhow::anyhow;
use gilliam_api::SpawnRequest;
use gilliam_core::merge_port_specs;

/// インスタンスの配置指定
#[derive(Debug, Clone, Default)]
pub struct Placement {
    pub assigned_to: Option<String>,
    pub requirements: Vec<String>,
    pub rank: Option<u32>,
}

pub async fn handle(
    ctx: &Context,
    service: &str,
    release: Option<&str>,
    ports: &[String],
    placement: Placement,
) -> anyhow::Result<()> {
    let formation = ctx
        .formation
        .as_deref()
        .ok_or_else(|| anyhow!("cannot detect formation"))?;

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;

    let release = find_release(&scheduler, formation, release)
        .await?
        .ok_or_else(|| anyhow!("no release in formation"))?;
    let descriptor = release
        .services
        .get(service)
        .ok_or_else(|| anyhow!("{service}: no such service"))?;

    let request = SpawnRequest {
        service: service.to_string(),
        release: release.name.clone(),
        image: descriptor.image.clone(),
        command: descriptor.command.clone(),
        env: descriptor.env.clone(),
        ports: merge_port_specs(&descriptor.ports, ports)?,
        assigned_to: placement.assigned_to,
        requirements: placement.requirements,
        rank: placement.rank,
    };
    tracing::debug!(formation, service, release = %release.name, ports = ?request.ports, "Spawning instance");

    let instance = scheduler.spawn(formation, &request).await?;
    if !ctx.quiet {
        println!("{}", instance.name);
    }
    Ok(())
}

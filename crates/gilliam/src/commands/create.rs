use crate::context::Context;
use anyhow::anyhow;
use colored::Colorize;

pub async fn handle(ctx: &Context, formation: &str) -> anyhow::Result<()> {
    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;

    let created = scheduler
        .create_formation(formation)
        .await
        .map_err(|e| {
            if e.is_conflict() {
                anyhow!("{formation}: formation already exists")
            } else {
                e.into()
            }
        })?;

    let pointers = ctx.formation_config()?;
    pointers.set_formation(&created.name)?;

    if !ctx.quiet {
        println!("{} {}", "created formation".green(), created.name.cyan());
    }
    Ok(())
}

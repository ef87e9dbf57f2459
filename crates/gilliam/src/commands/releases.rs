use crate::context::Context;
use crate::utils::{self, Column, col};
use anyhow::bail;
use gilliam_api::Scheduler;
use gilliam_core::Release;

const SPEC: &[Column] = &[col("name", 9), col("author", 15), col("message", 40)];

fn field(release: &Release, name: &str) -> String {
    match name {
        "name" => release.name.clone(),
        "author" => release.author.clone().unwrap_or_else(|| "unknown".to_string()),
        "message" => release.message.clone().unwrap_or_default(),
        _ => String::new(),
    }
}

pub async fn handle(ctx: &Context, dump: Option<&str>) -> anyhow::Result<()> {
    let formation = ctx.require_formation()?;
    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;
    let releases = scheduler.releases(formation).await?;

    if let Some(name) = dump {
        let Some(release) = releases.iter().find(|release| release.name == name) else {
            bail!("no such release");
        };
        print!("{}", serde_yaml::to_string(release)?);
        return Ok(());
    }

    utils::print_header(SPEC);
    for release in &releases {
        println!("{}", utils::format_row(SPEC, |name| field(release, name)));
    }
    Ok(())
}

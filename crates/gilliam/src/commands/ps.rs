use crate::context::Context;
use crate::utils::{self, Column, col};

const QUIET: &[Column] = &[col("name", 35)];
const NORMAL: &[Column] = &[col("name", 35), col("release", 7), col("state", 9)];
const VERBOSE: &[Column] = &[
    col("name", 35),
    col("release", 7),
    col("state", 9),
    col("assigned_to", 25),
    col("image", 25),
    col("command", 25),
];

fn spec(quiet: bool, verbose: bool) -> &'static [Column] {
    if quiet {
        QUIET
    } else if verbose {
        VERBOSE
    } else {
        NORMAL
    }
}

pub async fn handle(ctx: &Context, verbose: bool) -> anyhow::Result<()> {
    let formation = ctx.require_formation()?;
    let spec = spec(ctx.quiet, verbose);

    let stage = ctx.stage_config()?;
    let scheduler = ctx.scheduler(&stage)?;
    let instances = scheduler.instances(formation).await?;

    if !ctx.quiet {
        utils::print_header(spec);
    }
    for instance in &instances {
        println!("{}", utils::format_row(spec, |field| instance.field(field)));
    }
    Ok(())
}

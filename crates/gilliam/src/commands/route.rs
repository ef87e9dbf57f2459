use crate::context::Context;
use crate::utils::{self, Column, col};
use anyhow::anyhow;
use gilliam_core::Route;

const SPEC: &[Column] = &[
    col("name", 22),
    col("domain", 20),
    col("path", 20),
    col("target", 25),
];

/// `DOMAIN:PATH` または `PATH`
fn parse_route(route: &str) -> (Option<String>, String) {
    match route.split_once(':') {
        Some((domain, path)) => (Some(domain.to_string()), path.to_string()),
        None => (None, route.to_string()),
    }
}

/// ターゲットは常に HTTP
fn normalize_target(target: &str) -> String {
    if target.starts_with("http://") {
        target.to_string()
    } else {
        format!("http://{target}")
    }
}

pub async fn handle(
    ctx: &Context,
    delete: bool,
    route: Option<&str>,
    target: Option<&str>,
) -> anyhow::Result<()> {
    let stage = ctx.stage_config()?;
    let router = ctx.router(&stage)?;

    match (delete, route) {
        (true, None) => Err(anyhow!("must specify route name")),
        (true, Some(name)) => {
            router.delete(name).await?;
            if !ctx.quiet {
                println!("route {name} deleted");
            }
            Ok(())
        }
        (false, None) => {
            println!("{}", utils::format_row(SPEC, |field| field.to_string()));
            println!("{}", utils::header_rule(SPEC));
            for route in router.routes().await? {
                println!("{}", utils::format_row(SPEC, |field| route.field(field)));
            }
            Ok(())
        }
        (false, Some(route)) => {
            let target = target.ok_or_else(|| anyhow!("must specify route target"))?;
            let (domain, path) = parse_route(route);
            let request = Route {
                name: uuid::Uuid::new_v4().simple().to_string(),
                domain,
                path,
                target: normalize_target(target),
            };
            let created = router.create(&request).await?;
            println!("route {} created", created.name);
            Ok(())
        }
    }
}

//! レジストリ認証
//!
//! レジストリを省略するとステージのリポジトリから決めます。

use crate::context::Context;
use anyhow::bail;
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use gilliam_api::{DockerAuth, RegistryAuth, registry_from_repository};
use gilliam_config::stage::current_user;
use gilliam_config::{ConfigError, Credentials};
use std::io::{BufRead, IsTerminal, Write};

fn read_line(prompt: &str) -> anyhow::Result<String> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// エコーせずにパスワードを読む
fn read_password() -> anyhow::Result<String> {
    if !std::io::stdin().is_terminal() {
        return read_line("Password: ");
    }

    print!("Password: ");
    std::io::stdout().flush()?;
    terminal::enable_raw_mode()?;
    let password = read_hidden();
    terminal::disable_raw_mode()?;
    println!();
    password
}

fn read_hidden() -> anyhow::Result<String> {
    let mut password = String::new();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Enter => return Ok(password),
            KeyCode::Backspace => {
                password.pop();
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                bail!("interrupted")
            }
            KeyCode::Char(c) => password.push(c),
            _ => {}
        }
    }
}

fn prompt_credentials(
    username: Option<String>,
    password: Option<String>,
) -> anyhow::Result<Credentials> {
    let username = match username {
        Some(username) => username,
        None => {
            let default = current_user();
            let entered = read_line(&format!("Username ({default}): "))?;
            if entered.is_empty() { default } else { entered }
        }
    };
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    Ok(Credentials { username, password })
}

pub async fn handle(
    ctx: &Context,
    registry: Option<String>,
    username: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let registry = match registry {
        Some(registry) => registry,
        None => registry_from_repository(ctx.stage_config()?.repository()),
    };

    println!("Please enter credentials for {}:\n", registry.cyan());
    let credentials = prompt_credentials(username, password)?;

    if !DockerAuth::new().check(&registry, &credentials).await? {
        bail!("invalid username or password");
    }

    let mut cache = ctx.auth_cache()?;
    cache.update(|cache| {
        cache.store(&registry, credentials);
        Ok::<_, ConfigError>(())
    })?;

    if !ctx.quiet {
        println!("{} {}", "stored credentials for".green(), registry.cyan());
    }
    Ok(())
}

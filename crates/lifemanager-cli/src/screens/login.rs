use std::io::{self, Write};

use anyhow::{bail, Result};
use lifemanager_core::{Config, SessionManager};
use tracing::warn;

const USERNAME_ENV: &str = "LIFEMANAGER_USERNAME";

const PASSWORD_ENV: &str = "LIFEMANAGER_PASSWORD";

/// Interactive login. Username and password may also come from the
/// environment for scripted use.
pub async fn run(
    session: &SessionManager,
    last_username: Option<&str>,
    username: Option<String>,
) -> Result<()> {
    if session.is_authenticated() {
        println!("Already logged in. Run `lifemanager logout` to switch accounts.");
        return Ok(());
    }

    println!("\n=== Life Manager Login ===\n");

    let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
        Some(username) => username,
        None => prompt_username(last_username)?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => prompt_password()?,
    };

    println!("\nAuthenticating...");

    match session.login(&username, &password).await {
        Ok(success) => {
            remember_username(username.trim());
            if !success.is_persisted() {
                println!("Warning: the session could not be saved on this device and will end when this command exits.");
            }
            println!("Login successful!\n");
            Ok(())
        }
        Err(e) => bail!("Login failed: {}", e),
    }
}

fn prompt_username(last_username: Option<&str>) -> Result<String> {
    match last_username {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(resolve_username(&input, last_username))
}

fn prompt_password() -> Result<String> {
    let password = rpassword::prompt_password("Password: ")?;
    Ok(password)
}

/// Empty input accepts the suggested username.
fn resolve_username(input: &str, last_username: Option<&str>) -> String {
    let input = input.trim();
    match last_username {
        Some(last) if input.is_empty() => last.to_string(),
        _ => input.to_string(),
    }
}

/// Save the username for the next prompt. Overrides from flags or the
/// environment stay out of the file.
fn remember_username(username: &str) {
    let mut stored = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            warn!(error = %e, "Failed to load config, not saving username");
            return;
        }
    };
    stored.last_username = Some(username.to_string());
    if let Err(e) = stored.save() {
        warn!(error = %e, "Failed to save config");
    }
}

//! Subcommand implementations. Each returns whether it succeeded.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use cadshop_core::auth::hash_password as hash;
use cadshop_core::{AppConfig, Credentials, GuardView, MountedGuard};

/// Environment variable holding the login password
const PASSWORD_ENV: &str = "CADSHOP_ADMIN_PASSWORD";

fn prompt_username() -> Result<String> {
    print!("Username: ");
    io::stdout().flush()?;

    let mut username = String::new();
    io::stdin().read_line(&mut username)?;
    Ok(username.trim().to_string())
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

pub async fn login(config: &AppConfig, username: Option<String>) -> Result<bool> {
    let username = match username {
        Some(u) => u,
        None => prompt_username()?,
    };
    let password = read_password()?;

    let auth = config.build_authenticator()?;
    let result = auth.authenticate(&Credentials::new(username, password)).await;

    if result.success {
        let name = result.user.as_ref().map(|u| u.username.as_str()).unwrap_or("?");
        println!("Logged in as {}", name);
        Ok(true)
    } else {
        println!(
            "Login failed: {}",
            result.message.as_deref().unwrap_or("unknown error")
        );
        Ok(false)
    }
}

pub fn logout(config: &AppConfig) -> Result<bool> {
    config.build_authenticator()?.logout();
    println!("Logged out");
    Ok(true)
}

pub fn status(config: &AppConfig) -> Result<bool> {
    let auth = config.build_authenticator()?;
    if !auth.is_authenticated() {
        println!("Not logged in");
        return Ok(false);
    }

    match auth.current_user() {
        Some(user) => {
            println!("Logged in as {} ({})", user.username, user.role);
            println!("Since: {}", user.login_time.to_rfc3339());
            let remaining = user.minutes_until_expiry(auth.max_age());
            if remaining > 0 {
                println!("Offline expiry in {}h {}m", remaining / 60, remaining % 60);
            } else {
                println!("Offline expiry: expired");
            }
        }
        None => println!("Logged in (user record unreadable)"),
    }
    Ok(true)
}

pub async fn verify(config: &AppConfig) -> Result<bool> {
    let auth = config.build_authenticator()?;
    let valid = auth.verify_session().await?;
    println!("{}", if valid { "Session valid" } else { "Session invalid" });
    Ok(valid)
}

pub async fn open(config: &AppConfig, view: &str) -> Result<bool> {
    let auth = Arc::new(config.build_authenticator()?);
    let mut mounted = MountedGuard::mount(config.build_guard(auth.clone()));

    if let GuardView::Loading = mounted.render(|| ()) {
        eprintln!("Checking session...");
    }
    let state = mounted.settled().await;
    info!(?state, view, "Guard settled");

    match mounted.render(|| view.to_string()) {
        GuardView::Content(view) => {
            let user = auth.current_user().map(|u| u.username).unwrap_or_default();
            println!("Opened admin view '{}' for {}", view, user);
            Ok(true)
        }
        GuardView::Redirect(target) => {
            println!("Not authorized, redirecting to {}", target);
            Ok(false)
        }
        GuardView::Loading => {
            warn!("Guard still checking after settling");
            Ok(false)
        }
    }
}

pub fn hash_password() -> Result<bool> {
    let password = read_password()?;
    println!("{}", hash(&password)?);
    Ok(true)
}

//! Login, logout, whoami, menu, register.

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use folio_client::{Claims, GuardState, Role};
use serde_json::json;

use super::Output;

pub async fn login(config_path: &Path, email: &str, password: &str) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    let outcome = folio.auth().login(email, password).await?;

    let name = outcome.claims.as_ref().map(Claims::display_name).unwrap_or("Guest");
    match outcome.message {
        Some(message) => println!("{message}. Welcome, {name}."),
        None => println!("Logged in as {name}."),
    }
    Ok(())
}

pub async fn logout(config_path: &Path) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    match folio.auth().logout().await {
        Ok(()) => println!("Logged out."),
        // The local session is gone either way.
        Err(e) => println!("Logged out locally (backend said: {e})."),
    }
    Ok(())
}

pub async fn whoami(config_path: &Path, output: Output) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    let mount = folio.guard().mount();
    let state = mount.resolve().await.unwrap_or(GuardState::Checking);

    match (state, output) {
        (GuardState::Authorized(claims), Output::Json) => super::print_json(&json!({
            "authorized": true,
            "userId": claims.user_id,
            "username": claims.username,
            "role": claims.role.map(role_name),
            "expiresAt": claims.expires_at,
        }))?,
        (GuardState::Authorized(claims), Output::Table) => {
            println!("User:      {}", claims.display_name());
            if let Some(id) = &claims.user_id {
                println!("User ID:   {id}");
            }
            println!("Role:      {}", claims.role.map(role_name).unwrap_or("viewer"));
            println!("Expires:   {}", expiry(claims.expires_at));
        }
        (GuardState::Unauthorized(prompt), Output::Json) => super::print_json(&json!({
            "authorized": false,
            "reason": prompt.reason.to_string(),
        }))?,
        (GuardState::Unauthorized(prompt), Output::Table) => {
            println!("{}", prompt.title);
            println!("{}", prompt.message);
            println!("({})", prompt.reason);
            println!("{}: run `folio login`.", prompt.action_label);
        }
        (GuardState::Checking, _) => println!("Session check did not complete."),
    }
    Ok(())
}

pub fn menu(config_path: &Path, output: Output) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    let actions = folio.menu();
    match output {
        Output::Json => {
            let items: Vec<_> = actions
                .iter()
                .map(|a| json!({"label": a.label(), "route": a.route()}))
                .collect();
            super::print_json(&serde_json::Value::Array(items))?;
        }
        Output::Table => {
            println!("{:<20} ROUTE", "ACTION");
            for action in actions {
                println!("{:<20} {}", action.label(), action.route());
            }
        }
    }
    Ok(())
}

pub async fn register(config_path: &Path, username: &str, email: &str, password: &str) -> Result<()> {
    let (_, folio) = super::open(config_path)?;
    let reply = folio.auth().register(username, email, password).await?;
    match reply.get("message").and_then(|m| m.as_str()) {
        Some(message) => println!("{message}"),
        None => println!("User {username} created."),
    }
    Ok(())
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Owner => "owner",
        Role::Reviewer => "reviewer",
        Role::Viewer => "viewer",
    }
}

fn expiry(expires_at: i64) -> String {
    match DateTime::<Utc>::from_timestamp(expires_at, 0) {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => expires_at.to_string(),
    }
}

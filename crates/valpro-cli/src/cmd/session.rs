use crate::output::print_json;
use crate::workspace::Workspace;
use anyhow::Context;
use std::path::Path;
use valpro_core::session::Session;
use valpro_core::User;

pub fn login(root: &Path, user_id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    ws.block_on(ws.store.login_as(user_id))
        .with_context(|| format!("login as '{user_id}' failed"))?;
    Session::new(user_id)
        .save(root)
        .context("failed to save session")?;
    let user = ws.actor()?;

    if json {
        print_json(&user)?;
    } else {
        println!("Logged in as {}", describe(&user));
    }
    Ok(())
}

pub fn logout(root: &Path, json: bool) -> anyhow::Result<()> {
    if Session::load(root).context("failed to read session")?.is_none() {
        if json {
            print_json(&serde_json::json!({ "logged_out": false }))?;
        } else {
            println!("Not logged in.");
        }
        return Ok(());
    }

    let ws = Workspace::signed_in(root)?;
    let result = ws.block_on(ws.store.logout());
    Session::clear(root).context("failed to clear session")?;
    result.context("backend logout failed; local session cleared")?;

    if json {
        print_json(&serde_json::json!({ "logged_out": true }))?;
    } else {
        println!("Logged out.");
    }
    Ok(())
}

pub fn whoami(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let user = ws.actor()?;
    if json {
        print_json(&user)?;
    } else {
        println!("{}", describe(&user));
    }
    Ok(())
}

fn describe(user: &User) -> String {
    format!("{} ({}, {})", user.name, user.id, user.user_type)
}

use crate::output::{print_json, print_table};
use crate::workspace::Workspace;
use anyhow::{anyhow, Context};
use clap::Subcommand;
use std::path::Path;
use valpro_core::{CertificationStatus, User, UserType};

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// List users
    List {
        /// Filter by type: client, company, valuer, admin
        #[arg(long = "type", value_name = "TYPE")]
        user_type: Option<String>,
    },

    /// Show a user's profile
    Show { id: String },

    /// Edit your own profile
    Edit {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        signature_url: Option<String>,
    },

    /// Verify or reject a pending certification (admins)
    Cert {
        user_id: String,
        name: String,
        /// verified or rejected
        status: String,
    },
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        UserSubcommand::List { user_type } => list(root, user_type.as_deref(), json),
        UserSubcommand::Show { id } => show(root, &id, json),
        UserSubcommand::Edit {
            name,
            email,
            location,
            company,
            signature_url,
        } => edit(
            root,
            Edits {
                name,
                email,
                location,
                company,
                signature_url,
            },
            json,
        ),
        UserSubcommand::Cert {
            user_id,
            name,
            status,
        } => cert(root, &user_id, &name, &status, json),
    }
}

// `list` works without a session so a new user can find an id to log in as.
fn list(root: &Path, user_type: Option<&str>, json: bool) -> anyhow::Result<()> {
    let user_type = user_type.map(str::parse::<UserType>).transpose()?;
    let ws = Workspace::open(root)?;
    let snapshot = ws.block_on(ws.store.load()).context("failed to load users")?;
    let users: Vec<&User> = snapshot
        .users
        .iter()
        .filter(|u| user_type.map_or(true, |t| u.user_type == t))
        .collect();

    if json {
        return print_json(&users);
    }
    let rows = users
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.name.clone(),
                u.user_type.to_string(),
                u.email.clone(),
                if u.verified { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "TYPE", "EMAIL", "VERIFIED"], rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let user = ws
        .block_on(ws.store.user(id))
        .ok_or_else(|| anyhow!("user '{id}' not found"))?;
    if json {
        return print_json(&user);
    }

    println!("{}  {} ({})", user.id, user.name, user.user_type);
    println!("email:     {}", user.email);
    if let Some(company) = &user.company_name {
        println!("company:   {company}");
    }
    if let Some(location) = &user.location {
        println!("location:  {location}");
    }
    if let Some(rating) = user.rating {
        println!("rating:    {rating:.1}");
    }
    if !user.specializations.is_empty() {
        println!("focus:     {}", user.specializations.join(", "));
    }
    if !user.certifications.is_empty() {
        println!("\nCertifications:");
        for c in &user.certifications {
            println!("  [{}] {} ({}, {})", c.status, c.name, c.issuing_org, c.date);
        }
    }
    Ok(())
}

struct Edits {
    name: Option<String>,
    email: Option<String>,
    location: Option<String>,
    company: Option<String>,
    signature_url: Option<String>,
}

fn edit(root: &Path, edits: Edits, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let mut user = ws.actor()?;
    if let Some(name) = edits.name {
        user.name = name;
    }
    if let Some(email) = edits.email {
        user.email = email;
    }
    if edits.location.is_some() {
        user.location = edits.location;
    }
    if edits.company.is_some() {
        user.company_name = edits.company;
    }
    if edits.signature_url.is_some() {
        user.signature_url = edits.signature_url;
    }

    let saved = ws
        .block_on(ws.store.update_user(user))
        .context("update_user failed")?;
    if json {
        print_json(&saved)?;
    } else {
        println!("Updated profile for {}", saved.name);
    }
    Ok(())
}

fn cert(root: &Path, user_id: &str, name: &str, status: &str, json: bool) -> anyhow::Result<()> {
    let status: CertificationStatus = status.parse()?;
    let ws = Workspace::signed_in(root)?;
    let user = ws
        .block_on(ws.store.update_certification_status(user_id, name, status))
        .with_context(|| format!("update_certification_status failed for {user_id}"))?;
    if json {
        print_json(&user)?;
    } else {
        println!("{}: '{name}' -> {status}", user.name);
    }
    Ok(())
}

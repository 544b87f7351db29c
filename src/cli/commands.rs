//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler calls one client operation and prints its result as pretty
//! JSON on stdout. Errors are returned to [`super::run`] with context.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use super::args::Command;
use crate::client::CredHubClient;
use crate::core::credential::{Credential, CredentialType, WriteMode};

/// Run one command against a connected client.
pub async fn dispatch(command: Command, client: &CredHubClient) -> Result<()> {
    match command {
        Command::Info => print_json(&client.info().await.context("failed to fetch server info")?),
        Command::Find { path } => print_json(
            &client
                .find_by_path(&path)
                .await
                .with_context(|| format!("failed to list path '{}'", path))?,
        ),
        Command::Get {
            name,
            versions,
            latest,
        } => get(client, &name, versions, latest).await,
        Command::GetId { id } => print_json(
            &client
                .get_by_id(&id)
                .await
                .with_context(|| format!("failed to get version '{}'", id))?,
        ),
        Command::FindName { name_like } => print_json(
            &client
                .find_by_partial_name(&name_like)
                .await
                .with_context(|| format!("failed to search for '{}'", name_like))?,
        ),
        Command::Set {
            name,
            credential_type,
            value,
            mode,
        } => set(client, name, credential_type, &value, mode).await,
        Command::Delete { name } => {
            client
                .delete(&name)
                .await
                .with_context(|| format!("failed to delete '{}'", name))?;
            eprintln!("Deleted '{}'", name);
            Ok(())
        }
    }
}

async fn get(
    client: &CredHubClient,
    name: &str,
    versions: Option<usize>,
    latest: bool,
) -> Result<()> {
    let context = || format!("failed to get '{}'", name);
    if latest {
        print_json(&client.get_latest_by_name(name).await.with_context(context)?)
    } else {
        print_json(
            &client
                .get_by_name(name, false, versions)
                .await
                .with_context(context)?,
        )
    }
}

async fn set(
    client: &CredHubClient,
    name: String,
    credential_type: CredentialType,
    raw_value: &str,
    mode: WriteMode,
) -> Result<()> {
    let value = parse_value(credential_type, raw_value);
    let credential = Credential::new(name, credential_type, value);
    let stored = client
        .set(&credential, mode, None)
        .await
        .with_context(|| format!("failed to set '{}'", credential.name))?;
    print_json(&stored)
}

/// Interpret a command-line value for a credential of `credential_type`.
///
/// `value` and `password` payloads are always taken verbatim as strings.
/// Other types are parsed as JSON, falling back to a plain string.
pub fn parse_value(credential_type: CredentialType, raw: &str) -> Value {
    match credential_type {
        CredentialType::Value | CredentialType::Password => Value::String(raw.to_string()),
        _ => serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{}", rendered);
    Ok(())
}

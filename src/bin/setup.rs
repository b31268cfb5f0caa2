//! sheetbridge setup wizard.
//!
//! Prompts for the Discord bot token, the watched channel ID, the target
//! spreadsheet name and the service-account key path, then writes
//! `config.toml` to `$SHEETBRIDGE_ROOT` (default: the current directory).

use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;

// ── Config formatting ──────────────────────────────────────────────────────────

struct ConfigParams<'a> {
    bot_token: &'a str,
    channel_id: u64,
    reaction: &'a str,
    sheet_name: &'a str,
    credentials_path: &'a str,
    spreadsheet_id: &'a str,
}

/// Produces a valid config.toml string. Extracted so it can be unit-tested.
fn format_config(p: &ConfigParams<'_>) -> String {
    let id_line = if p.spreadsheet_id.is_empty() {
        "# spreadsheet_id = \"1AbC...\"  # skips the Drive lookup by name".to_owned()
    } else {
        format!("spreadsheet_id = \"{}\"", toml_escape(p.spreadsheet_id))
    };

    let bot_token = toml_escape(p.bot_token);
    let channel_id = p.channel_id;
    let reaction = toml_escape(p.reaction);
    let sheet_name = toml_escape(p.sheet_name);
    let credentials_path = toml_escape(p.credentials_path);

    format!(
        r#"[discord]
bot_token = "{bot_token}"
channel_id = {channel_id}
reaction = "{reaction}"

[sheets]
name = "{sheet_name}"
credentials_path = "{credentials_path}"
{id_line}
"#
    )
}

fn toml_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn parse_channel_id(input: &str) -> Result<u64> {
    let id: u64 = input
        .trim()
        .parse()
        .with_context(|| format!("Not a channel ID: {input}"))?;
    if id == 0 {
        anyhow::bail!("Channel ID must be non-zero");
    }
    Ok(id)
}

// ── Entry point ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Resolve project root: prefer SHEETBRIDGE_ROOT env, fall back to cwd.
    let project_root =
        PathBuf::from(std::env::var("SHEETBRIDGE_ROOT").unwrap_or_else(|_| ".".to_string()));

    println!("=== sheetbridge setup ===\n");

    let read_line = |prompt: &str| -> Result<String> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut buf = String::new();
        io::stdin().read_line(&mut buf)?;
        Ok(buf.trim().to_owned())
    };

    let or_default = |s: String, default: &str| {
        if s.is_empty() {
            default.to_owned()
        } else {
            s
        }
    };

    let bot_token = read_line("Discord bot token: ")?;
    let channel_id = parse_channel_id(&read_line("Channel ID to watch: ")?)?;
    let sheet_name = read_line("Spreadsheet name: ")?;
    let credentials_path = or_default(
        read_line("Service account key [credentials.json]: ")?,
        "credentials.json",
    );
    let spreadsheet_id = read_line("Spreadsheet ID (optional): ")?;
    let reaction = or_default(read_line("Reaction emoji [📊]: ")?, "📊");

    let config = format_config(&ConfigParams {
        bot_token: &bot_token,
        channel_id,
        reaction: &reaction,
        sheet_name: &sheet_name,
        credentials_path: &credentials_path,
        spreadsheet_id: &spreadsheet_id,
    });

    let config_path = project_root.join("config.toml");
    std::fs::write(&config_path, &config)
        .with_context(|| format!("Could not write {}", config_path.display()))?;

    println!("\n✓  config.toml saved to {}", config_path.display());
    println!("   Share the spreadsheet with the service account's client_email,");
    println!("   then run the bridge with:  cargo run");
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

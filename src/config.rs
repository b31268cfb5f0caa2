use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_DISCORD_TOKEN: &str = "SHEETBRIDGE_DISCORD_TOKEN";
pub const ENV_CHANNEL_ID: &str = "SHEETBRIDGE_CHANNEL_ID";
pub const ENV_REACTION: &str = "SHEETBRIDGE_REACTION";
pub const ENV_SHEET_NAME: &str = "SHEETBRIDGE_SHEET_NAME";
pub const ENV_CREDENTIALS: &str = "SHEETBRIDGE_CREDENTIALS";
pub const ENV_SPREADSHEET_ID: &str = "SHEETBRIDGE_SPREADSHEET_ID";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord: DiscordConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// The single channel whose messages are archived
    pub channel_id: u64,
    /// Emoji added to a message once its row is written
    pub reaction: String,
}

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Spreadsheet display name, resolved through Drive
    pub name: String,
    pub credentials_path: PathBuf,
    /// Skips the Drive name lookup when set
    pub spreadsheet_id: Option<String>,
}

// Loose file shape: every field optional so the environment can fill gaps.

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    discord: RawDiscord,
    #[serde(default)]
    sheets: RawSheets,
}

#[derive(Debug, Deserialize, Default)]
struct RawDiscord {
    bot_token: Option<String>,
    channel_id: Option<u64>,
    reaction: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct RawSheets {
    name: Option<String>,
    credentials_path: Option<PathBuf>,
    spreadsheet_id: Option<String>,
}

fn default_reaction() -> String {
    "📊".to_string()
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

impl Config {
    /// Load `path` if it exists, then apply `SHEETBRIDGE_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.exists() {
            Some(
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?,
            )
        } else {
            None
        };

        Self::from_sources(content.as_deref(), |key| std::env::var(key).ok())
    }

    /// Merge file contents with environment values; the environment wins.
    pub fn from_sources(
        toml_text: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let raw: RawConfig = match toml_text {
            Some(text) => toml::from_str(text).context("Failed to parse config file")?,
            None => RawConfig::default(),
        };

        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bot_token = env(ENV_DISCORD_TOKEN)
            .or(raw.discord.bot_token)
            .filter(|t| !t.trim().is_empty())
            .with_context(|| {
                format!("Missing Discord bot token ([discord] bot_token or {ENV_DISCORD_TOKEN})")
            })?;

        let channel_id = match env(ENV_CHANNEL_ID) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_CHANNEL_ID} is not a channel ID: {value}"))?,
            None => raw.discord.channel_id.with_context(|| {
                format!("Missing channel ID ([discord] channel_id or {ENV_CHANNEL_ID})")
            })?,
        };
        if channel_id == 0 {
            anyhow::bail!("Channel ID must be non-zero");
        }

        let reaction = env(ENV_REACTION)
            .or(raw.discord.reaction)
            .unwrap_or_else(default_reaction);

        let name = env(ENV_SHEET_NAME)
            .or(raw.sheets.name)
            .filter(|n| !n.trim().is_empty())
            .with_context(|| format!("Missing sheet name ([sheets] name or {ENV_SHEET_NAME})"))?;

        let credentials_path = env(ENV_CREDENTIALS)
            .map(PathBuf::from)
            .or(raw.sheets.credentials_path)
            .unwrap_or_else(default_credentials_path);

        let spreadsheet_id = env(ENV_SPREADSHEET_ID)
            .or(raw.sheets.spreadsheet_id)
            .filter(|id| !id.trim().is_empty());

        Ok(Config {
            discord: DiscordConfig {
                bot_token,
                channel_id,
                reaction,
            },
            sheets: SheetsConfig {
                name,
                credentials_path,
                spreadsheet_id,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const FULL: &str = r#"
[discord]
bot_token = "file-token"
channel_id = 1473757630676598930

[sheets]
name = "MK-12 Logistics Database"
"#;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_file_only_uses_defaults() {
        let config = Config::from_sources(Some(FULL), env_of(&[])).unwrap();
        assert_eq!(config.discord.bot_token, "file-token");
        assert_eq!(config.discord.channel_id, 1473757630676598930);
        assert_eq!(config.discord.reaction, "📊");
        assert_eq!(config.sheets.name, "MK-12 Logistics Database");
        assert_eq!(config.sheets.credentials_path, PathBuf::from("credentials.json"));
        assert!(config.sheets.spreadsheet_id.is_none());
    }

    #[test]
    fn test_env_overrides_file() {
        let env = env_of(&[
            (ENV_DISCORD_TOKEN, "env-token"),
            (ENV_CHANNEL_ID, "12345"),
            (ENV_CREDENTIALS, "/etc/sheetbridge/key.json"),
        ]);
        let config = Config::from_sources(Some(FULL), env).unwrap();
        assert_eq!(config.discord.bot_token, "env-token");
        assert_eq!(config.discord.channel_id, 12345);
        assert_eq!(
            config.sheets.credentials_path,
            PathBuf::from("/etc/sheetbridge/key.json")
        );
        assert_eq!(config.sheets.name, "MK-12 Logistics Database");
    }

    #[test]
    fn test_env_only_without_file() {
        let env = env_of(&[
            (ENV_DISCORD_TOKEN, "t"),
            (ENV_CHANNEL_ID, "7"),
            (ENV_SHEET_NAME, "Inventory"),
            (ENV_SPREADSHEET_ID, "1AbC"),
            (ENV_REACTION, "✅"),
        ]);
        let config = Config::from_sources(None, env).unwrap();
        assert_eq!(config.discord.channel_id, 7);
        assert_eq!(config.discord.reaction, "✅");
        assert_eq!(config.sheets.spreadsheet_id.as_deref(), Some("1AbC"));
    }

    #[test]
    fn test_missing_token_is_error() {
        let err = Config::from_sources(
            Some("[discord]\nchannel_id = 1\n[sheets]\nname = \"x\"\n"),
            env_of(&[]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("bot token"));
    }

    #[test]
    fn test_blank_env_value_does_not_override() {
        let config =
            Config::from_sources(Some(FULL), env_of(&[(ENV_DISCORD_TOKEN, "  ")])).unwrap();
        assert_eq!(config.discord.bot_token, "file-token");
    }

    #[test]
    fn test_bad_channel_id_rejected() {
        let env = env_of(&[(ENV_CHANNEL_ID, "data-log")]);
        assert!(Config::from_sources(Some(FULL), env).is_err());

        let zero = FULL.replace("1473757630676598930", "0");
        assert!(Config::from_sources(Some(&zero), env_of(&[])).is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.sheets.name, "MK-12 Logistics Database");
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_sources(Some("[discord\nbot_token ="), env_of(&[])).is_err());
    }
}

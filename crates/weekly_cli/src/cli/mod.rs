use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use weekly_core::config::ConfigOverrides;
use weekly_core::model::LinkData;

#[derive(Parser, Debug)]
#[command(name = "weekly", author, version, about = "Weekly checklist that resets every ISO week", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show this week's checklist
    ///
    /// Example: weekly list
    List,
    /// Add a task
    ///
    /// Example: weekly add "Call mom" --link whatsapp --data phone=+15550100 --data message=hi
    Add {
        text: Option<String>,
        /// Link type (none, whatsapp, calendar, email, spotify)
        #[arg(long, value_name = "TYPE", default_value = "none")]
        link: String,
        /// Link payload entry, repeatable
        #[arg(long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,
    },
    /// Edit a task's text or link
    ///
    /// Example: weekly edit 2 --text "Plan the week" --link calendar
    Edit {
        task: String,
        #[arg(long)]
        text: Option<String>,
        #[arg(long, value_name = "TYPE")]
        link: Option<String>,
        /// Replace the link payload, repeatable
        #[arg(long = "data", value_name = "KEY=VALUE")]
        data: Vec<String>,
        /// Drop the link payload
        #[arg(long, conflicts_with = "data")]
        clear_data: bool,
    },
    /// Delete a task
    ///
    /// Example: weekly delete 3
    Delete { task: String },
    /// Check or uncheck a task for this week
    ///
    /// Example: weekly check 1
    Check { task: String },
    /// Move a task to a position (1-based)
    ///
    /// Example: weekly move 3 1
    Move { task: String, position: usize },
    /// Set the full task order
    ///
    /// Example: weekly reorder default-3 default-1 default-2
    Reorder {
        #[arg(required = true, num_args = 1..)]
        tasks: Vec<String>,
    },
    /// Open a task's link
    ///
    /// Example: weekly open 1
    /// Example: weekly open 1 --print
    Open {
        task: String,
        /// Print the link instead of opening it
        #[arg(long)]
        print: bool,
    },
    /// Clear all checkmarks for this week
    ///
    /// Example: weekly reset
    Reset,
    /// Show or change settings
    ///
    /// Example: weekly settings --reset-day 1
    Settings {
        /// Day of week for resets, 0 = Sunday .. 6 = Saturday
        #[arg(long, value_name = "DAY")]
        reset_day: Option<u8>,
    },
    /// Export all data as JSON
    ///
    /// Example: weekly export --output backup.json
    Export {
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Replace all data with an exported file
    ///
    /// Example: weekly import backup.json
    Import { file: PathBuf },
    /// List available link types
    ///
    /// Example: weekly links
    Links,
    /// Show the current ISO week
    ///
    /// Example: weekly week
    Week,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Alias(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key, value) = split_key_value(raw)
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;
    let (field, remainder) = key
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key, None));

    match field.to_ascii_lowercase().as_str() {
        "" => Err("override key cannot be empty".to_string()),
        "theme" if remainder.is_some() => Err("theme override cannot have subfields".to_string()),
        "theme" => Ok(ParsedConfigOverride {
            target: ConfigOverrideTarget::Theme,
            value: value.to_string(),
        }),
        "aliases" | "alias" => {
            let alias = remainder
                .filter(|segment| !segment.is_empty())
                .ok_or_else(|| "aliases override requires an alias name".to_string())?;
            Ok(ParsedConfigOverride {
                target: ConfigOverrideTarget::Alias(alias.to_string()),
                value: value.to_string(),
            })
        }
        other => Err(format!("unknown config field '{other}'")),
    }
}

pub fn collect_overrides<S: AsRef<str>>(raw: &[S]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry.as_ref())?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Alias(alias) => {
                overrides.aliases.insert(alias, parsed.value);
            }
        }
    }
    Ok(overrides)
}

/// Pulls `--config-override` values out of raw arguments before parsing,
/// so alias expansion can see aliases defined on the command line.
pub fn scan_config_overrides(args: &[String]) -> Vec<String> {
    let mut found = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                found.push(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(CONFIG_OVERRIDE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            found.push(value.to_string());
        }
    }
    found
}

/// `--data KEY=VALUE` entries into a link payload. Later keys win.
pub fn parse_link_data<S: AsRef<str>>(entries: &[S]) -> Result<LinkData, String> {
    let mut data = LinkData::new();
    for entry in entries {
        let (key, value) = split_key_value(entry.as_ref())
            .ok_or_else(|| format!("link data '{}' must be KEY=VALUE", entry.as_ref()))?;
        if key.is_empty() {
            return Err("link data key cannot be empty".to_string());
        }
        data.insert(key.to_string(), value.to_string());
    }
    Ok(data)
}

fn split_key_value(raw: &str) -> Option<(&str, &str)> {
    raw.trim()
        .split_once('=')
        .map(|(key, value)| (key.trim(), value.trim()))
}

/// Replaces a leading alias with its command line. Aliases do not nest.
pub fn expand_alias(
    args: Vec<String>,
    aliases: &BTreeMap<String, String>,
) -> Result<Vec<String>, String> {
    let Some(expansion) = args.first().and_then(|first| aliases.get(first)) else {
        return Ok(args);
    };

    let mut expanded = split_command_line(expansion)?;
    expanded.extend(args.into_iter().skip(1));
    Ok(expanded)
}

/// Splits a line into arguments, honouring double quotes and `\"`.
pub fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        match ch {
            '\\' if in_quotes => escape = true,
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            ch if ch.is_whitespace() && !in_quotes => {
                if !current.is_empty() || quoted {
                    args.push(std::mem::take(&mut current));
                }
                quoted = false;
            }
            ch => current.push(ch),
        }
    }

    if in_quotes {
        return Err("unterminated quote in command".to_string());
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

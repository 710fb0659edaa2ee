use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use taskflow_core::config::ConfigOverrides;
use taskflow_core::error::AppError;
use taskflow_core::model::Category;
use taskflow_core::query::{CategoryFilter, SortMode, StatusFilter};

#[derive(Parser, Debug)]
#[command(name = "taskflow", author, version, about, long_about = None)]
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
    /// Add a new task
    ///
    /// Example: taskflow add "Buy milk" --due 2025-12-24 --category shopping
    Add {
        text: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_name = "YYYY-MM-DD")]
        due: Option<String>,
        /// personal, work, shopping, health or other
        #[arg(long)]
        category: Option<Category>,
    },
    /// Delete a task
    ///
    /// Example: taskflow delete 1
    Delete { id: u64 },
    /// Flip a task between pending and completed
    ///
    /// Example: taskflow toggle 1
    Toggle { id: u64 },
    /// Replace a task's text
    ///
    /// Example: taskflow edit 1 "Buy oat milk"
    Edit { id: u64, new_text: String },
    /// Delete every task
    ///
    /// Example: taskflow clear --force
    Clear {
        /// Confirm deleting all tasks
        #[arg(long)]
        force: bool,
    },
    /// Delete all completed tasks
    DeleteCompleted,
    /// Mark every pending task in the current view as completed
    ///
    /// Example: taskflow complete-all --search milk
    CompleteAll {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List tasks
    ///
    /// Example: taskflow list --filter pending --sort alphabetical
    List {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Show task statistics
    Stats {
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Write all tasks as a JSON backup
    ///
    /// Example: taskflow export --output taskflow_backup.json
    Export {
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Clear search, filters and sort
    Reset,
}

/// View selection flags. Each given flag replaces the session's setting.
#[derive(Args, Debug, Default, Clone)]
pub struct ViewArgs {
    /// Only tasks whose text contains TEXT (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,
    /// all, completed, pending, recent, due-today, overdue or no-due-date
    #[arg(long, value_name = "MODE")]
    pub filter: Option<StatusFilter>,
    /// all or a category name
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<CategoryFilter>,
    /// created-desc, created-asc, alphabetical, completion or due-date
    #[arg(long, value_name = "MODE")]
    pub sort: Option<SortMode>,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Search,
    DueDates,
    Categories,
    DefaultSort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let (field, remainder) = key_raw
        .split_once('.')
        .map(|(field, rest)| (field.trim(), Some(rest.trim())))
        .unwrap_or((key_raw.trim(), None));

    let canonical_field =
        canonicalize_flag_name(field).ok_or_else(|| "override key cannot be empty".to_string())?;

    let feature_name = match (canonical_field.as_str(), remainder) {
        ("features" | "feature", Some(name)) => canonicalize_flag_name(name)
            .ok_or_else(|| "features override requires a feature name".to_string())?,
        ("features" | "feature", None) => {
            return Err("features override requires a feature name".to_string());
        }
        (_, Some(_)) => return Err(format!("{canonical_field} override cannot have subfields")),
        (other, None) => other.to_string(),
    };

    let target = match feature_name.as_str() {
        "search" => ConfigOverrideTarget::Search,
        "due_dates" | "due_date" => ConfigOverrideTarget::DueDates,
        "categories" | "category" => ConfigOverrideTarget::Categories,
        "default_sort" | "sort" => ConfigOverrideTarget::DefaultSort,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Parse every `--config-override` value into one set of overrides. Later
/// values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Search => {
                overrides.search = Some(parse_switch(&parsed.value)?);
            }
            ConfigOverrideTarget::DueDates => {
                overrides.due_dates = Some(parse_switch(&parsed.value)?);
            }
            ConfigOverrideTarget::Categories => {
                overrides.categories = Some(parse_switch(&parsed.value)?);
            }
            ConfigOverrideTarget::DefaultSort => {
                overrides.default_sort = Some(parsed.value.parse()?);
            }
        }
    }

    Ok(overrides)
}

fn parse_switch(value: &str) -> Result<bool, AppError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(AppError::invalid_input(format!(
            "expected true or false, got '{other}'"
        ))),
    }
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Split an interactive input line into arguments. Double quotes group
/// words; inside quotes a backslash escapes `"` and `\`.
pub fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
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
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() || quoted {
        args.push(current);
    }

    Ok(args)
}

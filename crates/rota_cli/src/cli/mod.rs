use clap::{Args, Parser, Subcommand};
use rota_core::config::{ConfigOverrides, MAX_TIMEOUT_SECS};

#[derive(Parser, Debug)]
#[command(name = "rota", author, version, about = "Household chore rotation", long_about = None)]
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
    /// Show this week's assignments and pending counts
    ///
    /// Example: rota dashboard
    Dashboard,
    /// Add a new chore
    ///
    /// Example: rota add "Vacuum living room" --to Fernand --room "Living Room"
    Add {
        task_name: String,
        /// Participant who does it first
        #[arg(long = "to", value_name = "PERSON")]
        assigned_to: String,
        #[arg(long, default_value = "Other")]
        room: String,
        #[arg(long, default_value = "Weekly")]
        frequency: String,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long = "due", value_name = "DATE")]
        due_date: Option<String>,
    },
    /// List chores, newest first
    ///
    /// Example: rota list --person Yvonne --status pending
    /// Example: rota list --pending
    List(ListArgs),
    /// Show details of a chore
    ///
    /// Example: rota show 3
    Show { id: i64 },
    /// Mark a chore done and hand it to the next person
    ///
    /// Example: rota done 3
    Done { id: i64 },
    /// Put a chore back to pending without rotating
    ///
    /// Example: rota reset 3
    Reset { id: i64 },
    /// Edit a chore; with no fields, opens the edit form
    ///
    /// Example: rota edit 3 --name "Mop floors" --due 2026-02-01
    /// Example: rota edit 3 --clear-due
    Edit(EditArgs),
    /// Close the edit form of a chore without saving
    ///
    /// Example: rota cancel 3
    Cancel { id: i64 },
    /// Delete a chore
    ///
    /// Example: rota delete 3
    Delete { id: i64 },
    /// Show statistics over all chores
    ///
    /// Example: rota stats
    Stats,
    /// Reopen chores left completed by an interrupted rotation
    ///
    /// Example: rota reconcile
    Reconcile,
    /// Database setup helpers
    ///
    /// Example: rota setup check
    Setup {
        #[command(subcommand)]
        setup: SetupCommand,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub person: Option<String>,
    /// pending or completed
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub room: Option<String>,
    /// Pending chores ordered by due date
    #[arg(long, conflicts_with_all = ["completed_this_week", "person", "status", "room"])]
    pub pending: bool,
    /// Chores completed since Monday
    #[arg(long, conflicts_with_all = ["person", "status", "room"])]
    pub completed_this_week: bool,
}

#[derive(Args, Debug, Default)]
pub struct EditArgs {
    pub id: i64,
    #[arg(long = "name")]
    pub task_name: Option<String>,
    #[arg(long = "to", value_name = "PERSON")]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub room: Option<String>,
    #[arg(long)]
    pub frequency: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long = "due", value_name = "DATE", conflicts_with = "clear_due")]
    pub due_date: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
    #[arg(long)]
    pub clear_due: bool,
}

impl EditArgs {
    pub fn has_fields(&self) -> bool {
        self.task_name.is_some()
            || self.assigned_to.is_some()
            || self.room.is_some()
            || self.frequency.is_some()
            || self.description.is_some()
            || self.due_date.is_some()
            || self.clear_description
            || self.clear_due
    }
}

#[derive(Subcommand, Debug)]
pub enum SetupCommand {
    /// Print the CREATE TABLE statement
    ///
    /// Example: rota setup sql
    Sql,
    /// Insert sample chores
    ///
    /// Example: rota setup seed
    Seed,
    /// Check that the table can be reached
    ///
    /// Example: rota setup check
    Check,
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Participants,
    Table,
    Theme,
    TimeoutSecs,
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
    let canonical_field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match canonical_field.as_str() {
        "participants" | "people" => ConfigOverrideTarget::Participants,
        "table" => ConfigOverrideTarget::Table,
        "theme" => ConfigOverrideTarget::Theme,
        "timeout" | "timeout_secs" => ConfigOverrideTarget::TimeoutSecs,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() && target != ConfigOverrideTarget::Theme {
        return Err(format!("{canonical_field} override needs a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds parsed overrides into one set; later ones win.
pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Participants => {
                overrides.participants = Some(
                    parsed
                        .value
                        .split(',')
                        .map(|name| name.trim().to_string())
                        .collect(),
                );
            }
            ConfigOverrideTarget::Table => overrides.table = Some(parsed.value),
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::TimeoutSecs => {
                let secs = parsed
                    .value
                    .parse::<u64>()
                    .map_err(|_| format!("timeout must be whole seconds, got '{}'", parsed.value))?;
                if !(1..=MAX_TIMEOUT_SECS).contains(&secs) {
                    return Err(format!(
                        "timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds, got {secs}"
                    ));
                }
                overrides.timeout_secs = Some(secs);
            }
        }
    }
    Ok(overrides)
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

#[cfg(test)]
mod tests {
    use super::{Cli, Command, ConfigOverrideTarget, collect_overrides, parse_config_override};
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Noir ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Noir");
    }

    #[test]
    fn parse_config_override_accepts_timeout_spellings() {
        let parsed = parse_config_override("Timeout-Secs=3").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::TimeoutSecs);
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("unknown.field=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("tablechores").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_blank_table() {
        let err = parse_config_override("table=  ").unwrap_err();
        assert!(err.contains("needs a value"));
    }

    #[test]
    fn collect_overrides_splits_participants_and_parses_timeout() {
        let overrides = collect_overrides(&[
            "participants=Ana, Ben ,Cleo".to_string(),
            "timeout=4".to_string(),
            "table=chores".to_string(),
        ])
        .unwrap();

        assert_eq!(
            overrides.participants,
            Some(vec!["Ana".to_string(), "Ben".to_string(), "Cleo".to_string()])
        );
        assert_eq!(overrides.timeout_secs, Some(4));
        assert_eq!(overrides.table.as_deref(), Some("chores"));
    }

    #[test]
    fn collect_overrides_rejects_non_numeric_timeout() {
        let err = collect_overrides(&["timeout=soon".to_string()]).unwrap_err();
        assert!(err.contains("whole seconds"));
    }

    #[test]
    fn collect_overrides_rejects_out_of_range_timeout() {
        let err = collect_overrides(&["timeout=18446744073709551615".to_string()]).unwrap_err();
        assert!(err.contains("between 1 and 300"));

        let err = collect_overrides(&["timeout=0".to_string()]).unwrap_err();
        assert!(err.contains("between 1 and 300"));

        let overrides = collect_overrides(&["timeout=300".to_string()]).unwrap();
        assert_eq!(overrides.timeout_secs, Some(300));
    }

    #[test]
    fn edit_without_fields_only_opens_form() {
        let cli = Cli::try_parse_from(["rota", "edit", "4"]).unwrap();
        match cli.command {
            Command::Edit(args) => {
                assert_eq!(args.id, 4);
                assert!(!args.has_fields());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn list_pending_conflicts_with_filters() {
        let err = Cli::try_parse_from(["rota", "list", "--pending", "--person", "Yvonne"]);
        assert!(err.is_err());
    }

    #[test]
    fn add_requires_an_owner() {
        assert!(Cli::try_parse_from(["rota", "add", "Dishes"]).is_err());

        let cli = Cli::try_parse_from(["rota", "add", "Dishes", "--to", "Yvonne"]).unwrap();
        match cli.command {
            Command::Add {
                room, frequency, ..
            } => {
                assert_eq!(room, "Other");
                assert_eq!(frequency, "Weekly");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

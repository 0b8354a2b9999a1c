use clap::{Args, Parser, Subcommand};
use today_core::tasks::TaskId;

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "today",
    about = "A single-screen to-do list for the day",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub opts: GlobalOpts,
    /// Optional subcommand; defaults to launching the TUI when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOpts {
    /// Keep state in memory only; nothing is read from or written to disk.
    #[arg(long, global = true)]
    pub ephemeral: bool,
    /// Fail instead of starting empty when the stored state is unreadable.
    #[arg(long, global = true)]
    pub strict: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Launch the interactive view (press q or Esc to exit).
    Tui,
    /// Print version and exit.
    Version,
    /// Check that the configured storage can be written and read back.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    #[command(flatten)]
    Task(TaskCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TaskCommand {
    /// Print the task list, honoring the stored filter unless overridden.
    List {
        /// Only show tasks that are not done yet.
        #[arg(long, conflicts_with = "all")]
        pending: bool,
        /// Show done tasks too.
        #[arg(long)]
        all: bool,
    },
    /// Add a task.
    Add {
        /// What needs doing.
        description: Vec<String>,
        /// Estimated date (YYYY-MM-DD or RFC 3339); defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
    /// Mark a task done, or pending again if it is already done.
    Toggle { id: TaskId },
    /// Remove a task.
    Delete { id: TaskId },
    /// Show or hide completed tasks.
    Filter,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tui_subcommand() {
        let cli = Cli::try_parse_from(["today", "tui"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Tui));
    }

    #[test]
    fn defaults_to_tui_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["today"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
        assert_eq!(cli.opts, GlobalOpts::default());
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli = Cli::try_parse_from(["today", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }

    #[test]
    fn parses_add_with_multiword_description_and_date() {
        let cli = Cli::try_parse_from(["today", "add", "Buy", "milk", "--date", "2024-05-04"])
            .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Task(TaskCommand::Add {
                description: vec!["Buy".into(), "milk".into()],
                date: Some("2024-05-04".into()),
            }))
        );
    }

    #[test]
    fn parses_toggle_with_task_id() {
        let id = TaskId::generate();
        let cli = Cli::try_parse_from(["today", "toggle", &id.to_string()])
            .expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Task(TaskCommand::Toggle { id })));
    }

    #[test]
    fn rejects_non_uuid_ids() {
        assert!(Cli::try_parse_from(["today", "delete", "0.123"]).is_err());
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["today", "list", "--pending", "--ephemeral"])
            .expect("parse should succeed");
        assert!(cli.opts.ephemeral);
        assert_eq!(
            cli.command,
            Some(Command::Task(TaskCommand::List {
                pending: true,
                all: false
            }))
        );
    }

    #[test]
    fn list_filters_conflict() {
        assert!(Cli::try_parse_from(["today", "list", "--pending", "--all"]).is_err());
    }
}

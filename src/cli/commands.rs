use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally", about = concat!("tally v", env!("CARGO_PKG_VERSION"), " - time and task records in plain CSV"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different base directory (overrides `base_dir` in config.toml)
    #[arg(short = 'C', long = "base-dir", global = true)]
    pub base_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register years
    Year(YearCmd),
    /// Register tasks within a year
    Task(TaskCmd),
    /// Register months within a task
    Month(MonthCmd),
    /// Add, list and delete entries
    Entry(EntryCmd),
    /// Check that registries and files are in step
    Check,
    /// Search entries by regex
    Search(SearchArgs),
}

/// Year to act in; defaults to the most recently registered year
#[derive(Args, Clone, Default)]
pub struct YearScope {
    #[arg(long)]
    pub year: Option<String>,
}

// ---------------------------------------------------------------------------
// Years
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct YearCmd {
    #[command(subcommand)]
    pub action: YearAction,
}

#[derive(Subcommand)]
pub enum YearAction {
    /// Register a year (defaults to the year after the last one)
    New(YearNewArgs),
    /// List registered years
    List,
    /// Delete a year and everything under it
    Rm(YearRmArgs),
}

#[derive(Args)]
pub struct YearNewArgs {
    pub year: Option<String>,
}

#[derive(Args)]
pub struct YearRmArgs {
    pub year: String,
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TaskCmd {
    #[command(subcommand)]
    pub action: TaskAction,
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Register a task
    New(TaskNewArgs),
    /// List tasks of a year
    List(YearScope),
    /// Delete a task and all of its months
    Rm(TaskRmArgs),
}

#[derive(Args)]
pub struct TaskNewArgs {
    pub name: String,
    #[command(flatten)]
    pub scope: YearScope,
}

#[derive(Args)]
pub struct TaskRmArgs {
    pub name: String,
    #[command(flatten)]
    pub scope: YearScope,
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Months
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MonthCmd {
    #[command(subcommand)]
    pub action: MonthAction,
}

#[derive(Subcommand)]
pub enum MonthAction {
    /// Register a month and create its entry file
    New(MonthNewArgs),
    /// List months of a task
    List(MonthListArgs),
    /// Delete a month and its entries
    Rm(MonthRmArgs),
}

#[derive(Args)]
pub struct MonthNewArgs {
    pub task: String,
    /// Jan, Feb, ... Dec (any case)
    pub month: String,
    /// Columns for a task's first month, e.g. "pages:int, hours:time, note"
    #[arg(long)]
    pub header: Option<String>,
    #[command(flatten)]
    pub scope: YearScope,
}

#[derive(Args)]
pub struct MonthListArgs {
    pub task: String,
    #[command(flatten)]
    pub scope: YearScope,
}

#[derive(Args)]
pub struct MonthRmArgs {
    pub task: String,
    pub month: String,
    #[command(flatten)]
    pub scope: YearScope,
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct EntryCmd {
    #[command(subcommand)]
    pub action: EntryAction,
}

#[derive(Subcommand)]
pub enum EntryAction {
    /// Append an entry, one value per column
    Add(EntryAddArgs),
    /// Show the entries of one month, or of every month
    List(EntryListArgs),
    /// Delete one entry by row number
    Rm(EntryRmArgs),
}

#[derive(Args)]
pub struct EntryAddArgs {
    pub task: String,
    #[arg(required = true, allow_negative_numbers = true)]
    pub values: Vec<String>,
    /// Target month (defaults to the last registered month)
    #[arg(long)]
    pub month: Option<String>,
    #[command(flatten)]
    pub scope: YearScope,
}

#[derive(Args)]
pub struct EntryListArgs {
    pub task: String,
    /// Omit to show every month
    pub month: Option<String>,
    #[command(flatten)]
    pub scope: YearScope,
}

#[derive(Args)]
pub struct EntryRmArgs {
    pub task: String,
    pub month: String,
    /// Row number as shown by `entry list` (1-based)
    pub row: usize,
    #[command(flatten)]
    pub scope: YearScope,
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern
    pub pattern: String,
    /// Only search this year
    #[arg(long)]
    pub year: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_entry_add_accepts_negative_values() {
        let cli = Cli::try_parse_from([
            "tally", "entry", "add", "--month", "jan", "writing", "-3", "note",
        ]).unwrap();
        match cli.command {
            Some(Commands::Entry(EntryCmd {
                action: EntryAction::Add(args),
            })) => {
                assert_eq!(args.values, vec!["-3", "note"]);
                assert_eq!(args.month.as_deref(), Some("jan"));
            }
            _ => panic!("expected entry add"),
        }
    }
}

use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskmedic",
    version,
    about = "TaskMedic: offline-first ward jobs and bleeps",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "taskmedicrc", global = true)]
    pub taskmedicrc: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a job or a bleep.
    #[command(subcommand)]
    Add(AddCommand),
    /// List items using the stored filters, or the ones given here.
    List(ListArgs),
    /// Show every field of one item.
    Show { id: String },
    /// Mark an item done, or reopen it with --undo.
    Done {
        id: String,
        #[arg(long)]
        undo: bool,
    },
    Delete { id: String },
    /// Work with an item's tasks or actions.
    #[command(subcommand)]
    Check(CheckCommand),
    /// Add a progress note.
    Note { id: String, text: Vec<String> },
    /// Set the review-by time (`YYYY-MM-DDTHH:MM`), or `none` to clear it.
    Review { id: String, when: String },
    Urgency { id: String, urgency: UrgencyArg },
    /// Toggle whether a bleep has been called back.
    Callback { id: String },
    /// End the shift: remove every item.
    Wipe {
        #[arg(long)]
        yes: bool,
    },
    /// Write the list view as a standalone HTML page.
    Render {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write the stored document as JSON.
    Export {
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AddCommand {
    Job(AddJobArgs),
    Bleep(AddBleepArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonAddArgs {
    #[arg(long, value_enum, default_value_t = UrgencyArg::Amber)]
    pub urgency: UrgencyArg,
    /// `YYYY-MM-DDTHH:MM` in the configured display timezone.
    #[arg(long = "review-by")]
    pub review_by: Option<String>,
    #[arg(long = "secondary")]
    pub secondary: Option<String>,
    /// Repeat to add several tasks.
    #[arg(long = "task", action = ArgAction::Append)]
    pub tasks: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct AddJobArgs {
    #[arg(long)]
    pub summary: String,
    #[arg(long)]
    pub ward: Option<String>,
    #[arg(long)]
    pub bed: Option<String>,
    #[command(flatten)]
    pub common: CommonAddArgs,
}

#[derive(Args, Debug, Clone)]
pub struct AddBleepArgs {
    #[arg(long)]
    pub from: String,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub summary: Option<String>,
    #[arg(long = "called-back")]
    pub called_back: bool,
    #[command(flatten)]
    pub common: CommonAddArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CheckCommand {
    Add {
        id: String,
        text: Vec<String>,
        #[arg(long)]
        actions: bool,
    },
    Toggle {
        id: String,
        entry: String,
        #[arg(long)]
        actions: bool,
    },
    Rm {
        id: String,
        entry: String,
        #[arg(long)]
        actions: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
    #[arg(long, value_enum)]
    pub kind: Option<KindArg>,
    #[arg(long, value_enum)]
    pub sort: Option<SortArg>,
    #[arg(long)]
    pub search: Option<String>,
    /// Print one JSON object per visible item instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UrgencyArg {
    Red,
    #[default]
    Amber,
    Green,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusArg {
    All,
    Open,
    Done,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    All,
    Job,
    Bleep,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Triage,
    Newest,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` (or `rc.key:value`) overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = rest
                .split_once('=')
                .or_else(|| rest.split_once(':'))
                .map(|(k, v)| (format!("rc.{k}"), v.to_string()));

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<OsString> {
        raw.iter().map(OsString::from).collect()
    }

    #[test]
    fn positional_rc_overrides_are_removed() {
        let pre = preprocess_args(&args(&[
            "taskmedic",
            "rc.display.timezone=Europe/London",
            "list",
            "rc.color:off",
        ]))
        .expect("preprocess");

        assert_eq!(pre.cleaned_args, args(&["taskmedic", "list"]));
        assert_eq!(
            pre.rc_overrides,
            vec![
                ("rc.display.timezone".to_string(), "Europe/London".to_string()),
                ("rc.color".to_string(), "off".to_string()),
            ]
        );
    }

    #[test]
    fn add_job_collects_repeated_tasks() {
        let cli = GlobalCli::parse_from(args(&[
            "taskmedic",
            "add",
            "job",
            "--summary",
            "Chest pain",
            "--task",
            "ECG",
            "--task",
            "Troponin",
            "--urgency",
            "red",
        ]));

        let Some(Command::Add(AddCommand::Job(job))) = cli.command else {
            panic!("expected add job");
        };
        assert_eq!(job.summary, "Chest pain");
        assert_eq!(job.common.tasks, vec!["ECG", "Troponin"]);
        assert_eq!(job.common.urgency, UrgencyArg::Red);
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let cli = GlobalCli::parse_from(args(&["taskmedic", "list", "-vv", "--rc", "color=off"]));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.rc_overrides[0].key, "color");
        assert!(matches!(cli.command, Some(Command::List(_))));
    }
}

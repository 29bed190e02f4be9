use std::fmt;
use std::path::PathBuf;

use lingo_core::model::{
    AccountId, CefrLevel, ItemId, LanguageId, LevelParseError, ParseIdError,
};
use services::{AppServices, ScoringConfig};

mod commands;
mod telemetry;

use commands::Command;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str, operand: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    Invalid(lingo_core::Error),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command, operand } => {
                write!(f, "{command} requires <{operand}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<LevelParseError> for ArgsError {
    fn from(err: LevelParseError) -> Self {
        ArgsError::Invalid(err.into())
    }
}

impl From<ParseIdError> for ArgsError {
    fn from(err: ParseIdError) -> Self {
        ArgsError::Invalid(err.into())
    }
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  lingo [--db <sqlite_url>] [--account <id>] [--content <dir>] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  status                      levels and progress of started languages");
    eprintln!("  languages                   supported languages");
    eprintln!("  select <lang>               focus a language");
    eprintln!("  set-level <lang> <level>    choose a level by hand (A1..C1)");
    eprintln!("  complete <lang> <item>      mark a lesson, word or verb as learned");
    eprintln!("  placement <lang>            take the placement quiz");
    eprintln!("  level-test <lang>           take the test for the current level");
    eprintln!("  reset <lang>                forget one language's progress");
    eprintln!("  reset-all                   forget all progress");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://lingo.sqlite3");
    eprintln!("  --content demos/content");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LINGO_DB_URL, LINGO_ACCOUNT, LINGO_CONTENT_DIR, LOG_LEVEL");
}

#[derive(Debug)]
struct Args {
    db_url: String,
    account: Option<AccountId>,
    content_dir: PathBuf,
    command: Command,
}

impl Args {
    /// Parse flags and the command. `env` supplies fallbacks for unset flags.
    fn parse(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Self>, ArgsError> {
        let mut db_url = env("LINGO_DB_URL")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| "sqlite://lingo.sqlite3".into(), normalize_sqlite_url);
        let mut account = env("LINGO_ACCOUNT")
            .map(|value| value.parse::<AccountId>())
            .transpose()?;
        let mut content_dir =
            env("LINGO_CONTENT_DIR").map_or_else(|| PathBuf::from("demos/content"), PathBuf::from);

        let mut positional = Vec::new();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--account" => {
                    account = Some(require_value(&mut args, "--account")?.parse::<AccountId>()?);
                }
                "--content" => {
                    content_dir = PathBuf::from(require_value(&mut args, "--content")?);
                }
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = Command::parse(positional)?;
        Ok(Some(Self {
            db_url,
            account,
            content_dir,
            command,
        }))
    }
}

impl Command {
    fn parse(positional: Vec<String>) -> Result<Self, ArgsError> {
        let mut operands = positional.into_iter();
        let Some(name) = operands.next() else {
            return Ok(Command::Status);
        };

        let command = match name.as_str() {
            "status" => Command::Status,
            "languages" => Command::Languages,
            "select" => Command::Select(language(&mut operands, "select")?),
            "set-level" => {
                let lang = language(&mut operands, "set-level")?;
                let level = operand(&mut operands, "set-level", "level")?.parse::<CefrLevel>()?;
                Command::SetLevel(lang, level)
            }
            "complete" => {
                let lang = language(&mut operands, "complete")?;
                let item = operand(&mut operands, "complete", "item")?.parse::<ItemId>()?;
                Command::Complete(lang, item)
            }
            "placement" => Command::Placement(language(&mut operands, "placement")?),
            "level-test" => Command::LevelTest(language(&mut operands, "level-test")?),
            "reset" => Command::Reset(language(&mut operands, "reset")?),
            "reset-all" => Command::ResetAll,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        if let Some(extra) = operands.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        Ok(command)
    }
}

fn operand(
    operands: &mut impl Iterator<Item = String>,
    command: &'static str,
    operand: &'static str,
) -> Result<String, ArgsError> {
    operands
        .next()
        .ok_or(ArgsError::MissingOperand { command, operand })
}

fn language(
    operands: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<LanguageId, ArgsError> {
    Ok(operand(operands, command, "lang")?.parse::<LanguageId>()?)
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1), |key| std::env::var(key).ok()) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    // Open + migrate SQLite here so the library crates stay free of file-system setup.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        &parsed.content_dir,
        parsed.account.as_ref(),
        ScoringConfig::default(),
    )
    .await?;
    tracing::info!(db = %parsed.db_url, command = ?parsed.command, "running");

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    commands::execute(
        &services,
        parsed.command,
        &mut stdin.lock(),
        &mut stdout.lock(),
    )
    .await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    telemetry::init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

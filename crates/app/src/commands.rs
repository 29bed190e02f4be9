use std::fmt;
use std::io::{self, BufRead, Write};

use lingo_core::attempt::AttemptError;
use lingo_core::model::{CefrLevel, ItemId, LANGUAGES, Language, LanguageId, QuizQuestion};
use lingo_core::scoring::LevelVerdict;
use services::{AppServices, LevelTestAvailability, ProgressServiceError, QuizFlowError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Languages,
    Select(LanguageId),
    SetLevel(LanguageId, CefrLevel),
    Complete(LanguageId, ItemId),
    Placement(LanguageId),
    LevelTest(LanguageId),
    Reset(LanguageId),
    ResetAll,
}

#[derive(Debug)]
pub enum CommandError {
    UnknownLanguage(LanguageId),
    UnknownItem { language: LanguageId, item: ItemId },
    Io(io::Error),
    Progress(ProgressServiceError),
    Quiz(QuizFlowError),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownLanguage(lang) => write!(f, "language not found: {lang}"),
            CommandError::UnknownItem { language, item } => {
                write!(f, "no item {item} in the {language} content")
            }
            CommandError::Io(err) => write!(f, "i/o error: {err}"),
            CommandError::Progress(err) => write!(f, "{err}"),
            CommandError::Quiz(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommandError::Io(err) => Some(err),
            CommandError::Progress(err) => Some(err),
            CommandError::Quiz(err) => Some(err),
            CommandError::UnknownLanguage(_) | CommandError::UnknownItem { .. } => None,
        }
    }
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::Io(err)
    }
}

impl From<ProgressServiceError> for CommandError {
    fn from(err: ProgressServiceError) -> Self {
        CommandError::Progress(err)
    }
}

impl From<QuizFlowError> for CommandError {
    fn from(err: QuizFlowError) -> Self {
        CommandError::Quiz(err)
    }
}

impl From<AttemptError> for CommandError {
    fn from(err: AttemptError) -> Self {
        CommandError::Quiz(err.into())
    }
}

/// Run one command. Quizzes read answers from `input`; everything user-facing
/// goes to `out`.
pub async fn execute(
    services: &AppServices,
    command: Command,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match command {
        Command::Status => status(services, out).await,
        Command::Languages => languages(services, out).await,
        Command::Select(lang) => {
            require_known(services, &lang)?;
            services.progress().set_selected_language(&lang).await?;
            writeln!(out, "Now learning {}.", display_name(&lang))?;
            Ok(())
        }
        Command::SetLevel(lang, level) => {
            require_known(services, &lang)?;
            services.placement().confirm(&lang, level).await?;
            writeln!(
                out,
                "{} level set to {level} ({}).",
                display_name(&lang),
                level.label()
            )?;
            Ok(())
        }
        Command::Complete(lang, item) => complete(services, lang, item, out).await,
        Command::Placement(lang) => placement(services, &lang, input, out).await,
        Command::LevelTest(lang) => level_test(services, &lang, input, out).await,
        Command::Reset(lang) => {
            require_known(services, &lang)?;
            services.progress().reset_language_progress(&lang).await?;
            writeln!(out, "Progress for {} cleared.", display_name(&lang))?;
            Ok(())
        }
        Command::ResetAll => {
            services.progress().reset_progress().await?;
            writeln!(out, "All progress cleared.")?;
            Ok(())
        }
    }
}

fn require_known(services: &AppServices, lang: &LanguageId) -> Result<(), CommandError> {
    if Language::find(lang).is_some() || services.content().module(lang).is_some() {
        Ok(())
    } else {
        Err(CommandError::UnknownLanguage(lang.clone()))
    }
}

fn display_name(lang: &LanguageId) -> String {
    Language::find(lang).map_or_else(|| lang.to_string(), |l| format!("{} ({})", l.name, l.id))
}

async fn status(services: &AppServices, out: &mut impl Write) -> Result<(), CommandError> {
    let overviews = services.completion().language_overviews().await;
    // Without an explicit choice the first started language is in focus.
    let focus = match services.progress().selected_language().await {
        Some(lang) => Some(lang),
        None => overviews.first().map(|o| o.language.clone()),
    };
    match focus {
        Some(lang) => writeln!(out, "Selected language: {}", display_name(&lang))?,
        None => writeln!(out, "Selected language: none")?,
    }

    if overviews.is_empty() {
        writeln!(out, "No languages started yet. Try `lingo placement <lang>`.")?;
        return Ok(());
    }

    for overview in overviews {
        write!(
            out,
            "{:<16} {} {:<18}",
            display_name(&overview.language),
            overview.level,
            overview.level.label()
        )?;
        match overview.progress {
            Some(progress) => writeln!(
                out,
                " grammar {}/{}  vocabulary {}/{}  verbs {}/{}  ({:.0}%)",
                progress.grammar.completed,
                progress.grammar.total,
                progress.vocabulary.completed,
                progress.vocabulary.total,
                progress.verbs.completed,
                progress.verbs.total,
                progress.overall().percent()
            )?,
            None => writeln!(out, " content not installed")?,
        }
    }
    Ok(())
}

async fn languages(services: &AppServices, out: &mut impl Write) -> Result<(), CommandError> {
    let snapshot = services.progress().snapshot().await;
    let content = services.content();
    for language in &LANGUAGES {
        let id = language.language_id();
        let availability = if content.module(&id).is_some() {
            "available"
        } else {
            "coming soon"
        };
        let level = if snapshot.is_started(&id) {
            snapshot.level(&id).to_string()
        } else {
            "-".to_owned()
        };
        writeln!(
            out,
            "{} {:<3} {:<10} {:<10} {:<3} {}",
            language.flag, language.id, language.name, language.native_name, level, availability
        )?;
    }
    Ok(())
}

async fn complete(
    services: &AppServices,
    lang: LanguageId,
    item: ItemId,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    let Some(module) = services.content().module(&lang) else {
        return Err(CommandError::UnknownLanguage(lang));
    };
    let Some(found) = module.find_item(&item) else {
        return Err(CommandError::UnknownItem {
            language: lang,
            item,
        });
    };
    let category = found.category();

    if services.progress().mark_lesson_complete(&lang, &item).await? {
        writeln!(out, "Marked {item} ({}) as learned.", category.label())?;
    } else {
        writeln!(out, "{item} was already marked as learned.")?;
    }
    Ok(())
}

async fn placement(
    services: &AppServices,
    lang: &LanguageId,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    require_known(services, lang)?;
    let Some(mut session) = services.placement().start(lang) else {
        writeln!(
            out,
            "No placement quiz for {} yet. Pick a level with `lingo set-level`.",
            display_name(lang)
        )?;
        return Ok(());
    };

    writeln!(out, "Placement quiz for {}", display_name(lang))?;
    let total = session.attempt().total();
    let result = loop {
        let Some(question) = session.current_question().cloned() else {
            return Ok(());
        };
        let position = session.attempt().current_index().unwrap_or_default() + 1;
        let Some(choice) = ask(&question, position, total, input, out)? else {
            writeln!(out, "Quiz abandoned; nothing was saved.")?;
            return Ok(());
        };
        let correct = session.select(choice)?;
        reveal(&question, correct, out)?;
        if let Some(result) = session.advance()? {
            break result;
        }
    };

    writeln!(
        out,
        "You scored {}/{}. Suggested level: {} ({}).",
        result.score,
        result.total,
        result.suggested,
        result.suggested.label()
    )?;
    write!(
        out,
        "Start at {}? [Y/n, or type a level A1-C1] ",
        result.suggested
    )?;
    out.flush()?;

    let chosen = match read_answer(input)? {
        None => None,
        Some(answer) if answer.is_empty() || answer.eq_ignore_ascii_case("y") => {
            Some(result.suggested)
        }
        Some(answer) => answer.to_ascii_uppercase().parse::<CefrLevel>().ok(),
    };
    match chosen {
        Some(level) => {
            services.placement().confirm(lang, level).await?;
            writeln!(out, "Starting {} at {level}.", display_name(lang))?;
        }
        None => writeln!(out, "No level saved.")?,
    }
    Ok(())
}

async fn level_test(
    services: &AppServices,
    lang: &LanguageId,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    require_known(services, lang)?;
    let mut session = match services.level_tests().start(lang).await {
        LevelTestAvailability::UnknownLanguage => {
            writeln!(out, "No level test for {} yet.", display_name(lang))?;
            return Ok(());
        }
        LevelTestAvailability::NoQuestions { level } => {
            writeln!(out, "No {level} test for {} yet.", display_name(lang))?;
            return Ok(());
        }
        LevelTestAvailability::Ready(session) => session,
    };

    writeln!(
        out,
        "{} level test for {}",
        session.level(),
        display_name(lang)
    )?;
    let total = session.attempt().total();
    loop {
        let outcome = loop {
            let Some(question) = session.current_question().cloned() else {
                return Ok(());
            };
            let position = session.attempt().current_index().unwrap_or_default() + 1;
            let Some(choice) = ask(&question, position, total, input, out)? else {
                writeln!(out, "Test abandoned; nothing was saved.")?;
                return Ok(());
            };
            let correct = session.select(choice)?;
            reveal(&question, correct, out)?;
            if let Some(outcome) = session.advance()? {
                break outcome;
            }
        };

        writeln!(out, "You scored {}/{}.", outcome.score, outcome.total)?;
        match outcome.verdict() {
            LevelVerdict::Advance(next) => {
                write!(out, "Level passed! Advance to {next}? [Y/n] ")?;
                out.flush()?;
                if confirmed(input, true)? {
                    if let Some(level) = services.level_tests().advance(lang, &outcome).await? {
                        writeln!(out, "{} is now at {level}.", display_name(lang))?;
                    }
                } else {
                    writeln!(out, "Staying at {}.", outcome.level)?;
                }
                return Ok(());
            }
            LevelVerdict::HighestLevelReached => {
                writeln!(out, "Level passed! You have reached the highest level.")?;
                return Ok(());
            }
            LevelVerdict::Failed => {
                let required = services
                    .level_tests()
                    .policy()
                    .threshold
                    .required_score(outcome.total);
                writeln!(
                    out,
                    "Keep practising! You need {required} correct answers to advance."
                )?;
                write!(out, "Try again? [y/N] ")?;
                out.flush()?;
                if !confirmed(input, false)? {
                    return Ok(());
                }
                session.retry()?;
            }
        }
    }
}

/// Show a question and read an option by number. `None` when input ends.
fn ask(
    question: &QuizQuestion,
    position: usize,
    total: usize,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<String>, CommandError> {
    writeln!(out)?;
    writeln!(out, "[{position}/{total}] {}", question.prompt)?;
    if let Some(hint) = &question.hint {
        writeln!(out, "  hint: {hint}")?;
    }
    for (i, option) in question.options.iter().enumerate() {
        writeln!(out, "  {}) {option}", i + 1)?;
    }

    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(answer) = read_answer(input)? else {
            return Ok(None);
        };
        let picked = answer
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| question.options.get(i));
        match picked {
            Some(option) => return Ok(Some(option.clone())),
            None => writeln!(out, "Pick a number from 1 to {}.", question.options.len())?,
        }
    }
}

fn reveal(question: &QuizQuestion, correct: bool, out: &mut impl Write) -> io::Result<()> {
    if correct {
        writeln!(out, "Correct!")
    } else {
        writeln!(out, "Not quite. The answer is: {}", question.answer)
    }
}

fn confirmed(input: &mut impl BufRead, default: bool) -> io::Result<bool> {
    Ok(match read_answer(input)? {
        None => false,
        Some(answer) if answer.is_empty() => default,
        Some(answer) => answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"),
    })
}

fn read_answer(input: &mut impl BufRead) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

use std::fmt;
use std::io::{BufRead, Write};

use quiz_core::model::{Question, QuizId};
use services::{AppServices, Clock, FinishOutcome, QuizSession, SubmissionChange};
use storage::repository::QuizRepository;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    InvalidQuizId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidQuizId { raw } => write!(f, "invalid quiz id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- import <file.json> [--title <title>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- list   [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- play  <quiz-id> [--user <name>] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- stats <quiz-id> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL");
}

#[derive(Debug)]
enum Command {
    Import { file: String, title: Option<String> },
    List,
    Play { quiz_id: QuizId, user: Option<String> },
    Stats { quiz_id: QuizId },
}

struct Args {
    db_url: String,
    command: Command,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_quiz_id(raw: &str) -> Result<QuizId, ArgsError> {
    raw.parse::<QuizId>().map_err(|_| ArgsError::InvalidQuizId {
        raw: raw.to_string(),
    })
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);

        let mut iter = argv.into_iter();
        let subcommand = iter.next().ok_or(ArgsError::MissingArgument {
            what: "subcommand (import | list | play | stats)",
        })?;

        let mut positionals: Vec<String> = Vec::new();
        let mut title: Option<String> = None;
        let mut user: Option<String> = None;

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut iter, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--title" => title = Some(require_value(&mut iter, "--title")?),
                "--user" => user = Some(require_value(&mut iter, "--user")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    return Err(ArgsError::UnknownArg(arg));
                }
                _ => positionals.push(arg),
            }
        }

        let mut positionals = positionals.into_iter();
        let command = match subcommand.as_str() {
            "import" => Command::Import {
                file: positionals.next().ok_or(ArgsError::MissingArgument {
                    what: "quiz JSON file",
                })?,
                title,
            },
            "list" => Command::List,
            "play" => Command::Play {
                quiz_id: parse_quiz_id(&positionals.next().ok_or(
                    ArgsError::MissingArgument { what: "quiz id" },
                )?)?,
                user,
            },
            "stats" => Command::Stats {
                quiz_id: parse_quiz_id(&positionals.next().ok_or(
                    ArgsError::MissingArgument { what: "quiz id" },
                )?)?,
            },
            _ => return Err(ArgsError::UnknownArg(subcommand)),
        };

        if let Some(extra) = positionals.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Self { db_url, command })
    }
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

async fn import(
    services: &AppServices,
    file: &str,
    title: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(file)?;
    let title = title.unwrap_or_else(|| {
        std::path::Path::new(file)
            .file_stem()
            .map_or_else(|| file.to_string(), |stem| stem.to_string_lossy().into_owned())
    });

    let quiz_id = services.import().import(&title, &json).await?;
    println!("Imported \"{title}\" as quiz {quiz_id}.");
    Ok(())
}

async fn list(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let quizzes = services.quizzes().list_quizzes(64).await?;
    if quizzes.is_empty() {
        println!("No quizzes yet; add one with the import command.");
        return Ok(());
    }
    for quiz in quizzes {
        println!(
            "{:>4}  {} ({} questions)",
            quiz.id(),
            quiz.title(),
            quiz.question_count()
        );
    }
    Ok(())
}

fn label_index(question: &Question, input: &str) -> Option<usize> {
    question
        .kind()
        .labels()
        .iter()
        .position(|label| label.eq_ignore_ascii_case(input))
}

fn print_question(session: &QuizSession) {
    let question = session.current_question();
    println!();
    println!(
        "Question {}/{}: {}",
        session.current_index() + 1,
        session.total_questions(),
        question.text()
    );
    for (index, answer) in question.answers().iter().enumerate() {
        println!("  {}) {}", question.label(index), answer);
    }
    if let Some(selected) = session.user_answers()[session.current_index()] {
        println!("  [currently selected: {}]", question.label(selected));
    }
    println!("  (answer with a label; n = next, p = previous, finish, quit, abandon)");
}

fn print_outcome(outcome: &FinishOutcome) {
    println!();
    println!(
        "Score: {}/{} ({}%)",
        outcome.report.correct,
        outcome.report.total,
        outcome.report.percentage()
    );
    let mc = outcome.breakdown.multiple_choice;
    if mc.total > 0 {
        println!("  multiple choice: {}/{}", mc.correct, mc.total);
    }
    let tf = outcome.breakdown.true_false;
    if tf.total > 0 {
        println!("  true/false: {}/{}", tf.correct, tf.total);
    }
    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
}

async fn play(
    services: &AppServices,
    quiz_id: QuizId,
    user: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let workflow = services.workflow();
    // Watch the submission stream so a recorded finish refreshes the
    // statistics shown below the score.
    let mut submission_events = services.notifier().watch_submissions();
    let mut session = workflow.start_session(quiz_id).await?;

    if session.current_index() > 0 || session.user_answers().iter().any(Option::is_some) {
        println!("Resuming your session in progress.");
    }

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_question(&session);
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            println!();
            println!("Progress saved; play again to resume.");
            return Ok(());
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input.to_ascii_lowercase().as_str() {
            "n" | "next" => {
                if session.is_last_question() {
                    println!("Already at the last question.");
                } else {
                    workflow.advance(&mut session).await?;
                }
            }
            "p" | "prev" | "previous" => {
                if session.is_first_question() {
                    println!("Already at the first question.");
                } else {
                    workflow.go_back(&mut session).await?;
                }
            }
            "finish" => {
                if !session.has_answered_current() {
                    println!("Answer the current question before finishing.");
                    continue;
                }
                let outcome = workflow.finish(&mut session, user.as_deref()).await?;
                print_outcome(&outcome);
                if let Some(SubmissionChange::Recorded { quiz_id }) =
                    submission_events.try_recv()
                {
                    match services.statistics().quiz_view(quiz_id).await {
                        Ok(view) => {
                            if let Some(average) = view.average_score {
                                println!(
                                    "This quiz now has {} submissions averaging {average}%.",
                                    view.submission_count
                                );
                            }
                        }
                        Err(err) => println!("statistics unavailable: {err}"),
                    }
                }
                return Ok(());
            }
            "quit" => {
                println!("Progress saved; play again to resume.");
                return Ok(());
            }
            "abandon" => {
                workflow.abandon(session).await?;
                println!("Session abandoned.");
                return Ok(());
            }
            other => match label_index(session.current_question(), other) {
                Some(index) => {
                    workflow.select_answer(&mut session, index).await?;
                }
                None => println!("Unrecognized input: {input}"),
            },
        }
    }
}

async fn stats(
    services: &AppServices,
    quiz_id: QuizId,
) -> Result<(), Box<dyn std::error::Error>> {
    let statistics = services.statistics();

    // Each view loads independently; one failing must not hide the others.
    match statistics.quiz_view(quiz_id).await {
        Ok(view) => {
            println!("Submissions: {}", view.submission_count);
            match (view.average_score, view.highest_score, view.lowest_score) {
                (Some(avg), Some(high), Some(low)) => {
                    println!("Scores: avg {avg}%, high {high}%, low {low}%");
                }
                _ => println!("Scores: no submissions yet"),
            }
            println!("Questions: {}", view.question_count);
        }
        Err(err) => println!("quiz statistics unavailable: {err}"),
    }

    match statistics.question_view(quiz_id).await {
        Ok(questions) => {
            for question in questions {
                println!();
                println!(
                    "{} — {} guesses, {}% correct",
                    question.text, question.total_guesses, question.correct_percentage
                );
                match statistics.answer_view(question.question_id).await {
                    Ok(answers) => {
                        for answer in answers {
                            let marker = if answer.is_correct { "*" } else { " " };
                            println!(
                                " {marker}{}) {} — {} ({}%)",
                                answer.label, answer.text, answer.guesses, answer.percentage
                            );
                        }
                    }
                    Err(err) => println!("  answer statistics unavailable: {err}"),
                }
            }
        }
        Err(err) => println!("question statistics unavailable: {err}"),
    }

    match statistics.leaderboard(quiz_id, 10).await {
        Ok(board) if !board.is_empty() => {
            println!();
            println!("Leaderboard:");
            for (place, entry) in board.iter().enumerate() {
                println!(
                    "  {}. {} — {}% ({}/{})",
                    place + 1,
                    entry.user,
                    entry.score_percentage,
                    entry.correct_count,
                    entry.total_questions
                );
            }
        }
        Ok(_) => {}
        Err(err) => println!("leaderboard unavailable: {err}"),
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so
    // core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock()).await?;

    match parsed.command {
        Command::Import { file, title } => import(&services, &file, title).await,
        Command::List => list(&services).await,
        Command::Play { quiz_id, user } => play(&services, quiz_id, user).await,
        Command::Stats { quiz_id } => stats(&services, quiz_id).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

use std::fmt;
use std::io::Write as _;

use quiz_core::model::{Answer, QuestionType, QuizMode};
use quiz_core::{Feedback, Reveal};
use services::{Advance, QuizConfig, QuizController, SessionPhase, StartOutcome};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_CATALOG: &str = "data/catalog.toml";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidMode { raw: String },
    InvalidCount { raw: String },
    EmptyUnits,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidMode { raw } => {
                write!(f, "invalid --mode value (expected mcq, open, chain or mixed): {raw}")
            }
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::EmptyUnits => write!(f, "--units needs at least one unit name"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Units,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "units" => Some(Self::Units),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    command: Command,
    catalog: String,
    units: Option<Vec<String>>,
    mode: QuizMode,
    count: Option<i64>,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut args = argv.into_iter().peekable();

        let command = match args.peek().map(String::as_str) {
            None => Command::Run,
            Some(first) if first.starts_with('-') => Command::Run,
            Some(first) => Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.to_string()))?,
        };
        if args.peek().is_some_and(|first| !first.starts_with('-')) {
            args.next();
        }

        let mut catalog =
            std::env::var("QUIZ_CATALOG").unwrap_or_else(|_| DEFAULT_CATALOG.to_string());
        let mut units = None;
        let mut mode = QuizMode::default();
        let mut count = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--catalog" => catalog = require_value(&mut args, "--catalog")?,
                "--units" => {
                    let value = require_value(&mut args, "--units")?;
                    let names: Vec<String> = value
                        .split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect();
                    if names.is_empty() {
                        return Err(ArgsError::EmptyUnits);
                    }
                    units = Some(names);
                }
                "--mode" => {
                    let value = require_value(&mut args, "--mode")?;
                    mode = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMode { raw: value.clone() })?;
                }
                "--count" => {
                    let value = require_value(&mut args, "--count")?;
                    let parsed: i64 = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidCount { raw: value.clone() })?;
                    count = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            command,
            catalog,
            units,
            mode,
            count,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [run] [--catalog <path>] [--units A,B] [--mode <mode>] [--count <n>]");
    eprintln!("  cargo run -p app -- units [--catalog <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --catalog <path>   Units catalog (default: {DEFAULT_CATALOG})");
    eprintln!("  --units <A,B>      Units to quiz on (default: every catalog unit)");
    eprintln!("  --mode <mode>      mcq, open, chain or mixed (default: mixed)");
    eprintln!("  --count <n>        Questions per session (default: catalog default_count)");
    eprintln!("  -h, --help         Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_CATALOG, QUIZ_DATA_ROOT, QUIZ_LOG (tracing filter, default: warn)");
}

//
// ─── TERMINAL IO ───────────────────────────────────────────────────────────────
//

enum Input {
    Line(String),
    Quit,
}

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `prompt` and read one line. `q` and end of input both quit.
    async fn ask(&mut self, prompt: &str) -> std::io::Result<Input> {
        print!("{prompt}");
        std::io::stdout().flush()?;
        match self.lines.next_line().await? {
            Some(line) if line.trim().eq_ignore_ascii_case("q") => Ok(Input::Quit),
            Some(line) => Ok(Input::Line(line.trim().to_string())),
            None => Ok(Input::Quit),
        }
    }
}

//
// ─── QUIZ LOOP ─────────────────────────────────────────────────────────────────
//

fn parse_numbers(line: &str) -> Option<Vec<usize>> {
    line.split_whitespace()
        .map(|raw| raw.parse::<usize>().ok().filter(|&n| n > 0).map(|n| n - 1))
        .collect()
}

/// Ask until the current question is graded. `None` means the user quit.
async fn answer_current(
    quiz: &mut QuizController,
    term: &mut Terminal,
    kind: QuestionType,
) -> Result<Option<Feedback>, Box<dyn std::error::Error>> {
    loop {
        match kind {
            QuestionType::Mcq => {
                let Input::Line(line) = term.ask("Your answer (number, q to quit): ").await?
                else {
                    return Ok(None);
                };
                let Some(&[choice]) = parse_numbers(&line).as_deref() else {
                    println!("Enter a single choice number.");
                    continue;
                };
                if let Err(err) = quiz.choose(choice) {
                    println!("{err}");
                    continue;
                }
            }
            QuestionType::Chain => {
                let Input::Line(line) = term.ask("Step order (e.g. 2 1 3, q to quit): ").await?
                else {
                    return Ok(None);
                };
                let Some(order) = parse_numbers(&line).filter(|order| !order.is_empty()) else {
                    println!("Enter step numbers separated by spaces.");
                    continue;
                };
                quiz.clear_steps()?;
                if let Some(err) = order.into_iter().find_map(|step| quiz.pick_step(step).err()) {
                    println!("{err}");
                    continue;
                }
            }
            QuestionType::Open => {
                if let Input::Quit = term.ask("Press Enter to reveal (q to quit): ").await? {
                    return Ok(None);
                }
                return Ok(Some(quiz.submit_answer(&Answer::Reveal)?));
            }
        }

        match quiz.submit_selection() {
            Ok(feedback) => return Ok(Some(feedback)),
            Err(err) => println!("{err}"),
        }
    }
}

fn print_feedback(feedback: &Feedback, kind: QuestionType, options: &[String]) {
    println!("{}", feedback.verdict.label(kind));
    match &feedback.reveal {
        Reveal::Choice(index) => {
            if let Some(choice) = options.get(*index) {
                println!("Answer: {}. {choice}", index + 1);
            }
        }
        Reveal::KeyPoints(points) => {
            if points.is_empty() {
                println!("(no key points recorded)");
            }
            for point in points {
                println!("  - {point}");
            }
        }
        Reveal::Order(order) => {
            println!("Correct order:");
            for (n, step) in order.iter().filter_map(|&i| options.get(i)).enumerate() {
                println!("  {}. {step}", n + 1);
            }
        }
    }
}

async fn play(quiz: &mut QuizController) -> Result<(), Box<dyn std::error::Error>> {
    let mut term = Terminal::new();

    loop {
        let Some(view) = quiz.current() else {
            break;
        };
        let kind = view.question.kind();
        let options: Vec<String> = match kind {
            QuestionType::Mcq => view.question.choices().to_vec(),
            QuestionType::Chain => view.question.steps().to_vec(),
            QuestionType::Open => Vec::new(),
        };

        println!();
        println!("[{}/{}] {}", view.position, view.total, view.meta());
        println!("{}", view.stem());
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }

        let Some(feedback) = answer_current(quiz, &mut term, kind).await? else {
            quiz.reset_session();
            println!("Session reset.");
            return Ok(());
        };
        print_feedback(&feedback, kind, &options);

        if let Input::Quit = term.ask("Press Enter to continue (q to quit): ").await? {
            quiz.reset_session();
            println!("Session reset.");
            return Ok(());
        }
        match quiz.advance()? {
            Advance::Next(index) => debug!(index, "advanced"),
            Advance::Completed | Advance::AlreadyComplete => break,
            Advance::NotAnswered => {}
        }
    }

    if quiz.phase() == SessionPhase::Complete {
        let summary = quiz.summary()?;
        println!();
        println!(
            "Done: {} correct, {} incorrect, {} open answers reviewed ({} questions).",
            summary.correct(),
            summary.incorrect(),
            summary.submitted(),
            summary.total_questions()
        );
    }
    Ok(())
}

//
// ─── ENTRY ─────────────────────────────────────────────────────────────────────
//

fn init_tracing() {
    let filter = EnvFilter::try_from_env("QUIZ_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args = Args::parse(std::env::args().skip(1).collect()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = QuizConfig::load(&args.catalog)?.with_env_overrides();
    debug!(catalog = %args.catalog, data_root = %config.data_root, "catalog loaded");

    if args.command == Command::Units {
        for entry in &config.units {
            println!("{}\t{}", entry.name, entry.source);
        }
        return Ok(());
    }

    let mut quiz = QuizController::from_config(config)?;
    let units = match args.units {
        Some(units) => units,
        None => quiz
            .catalog()
            .iter()
            .map(|entry| entry.name.to_string())
            .collect(),
    };
    quiz.select_units(&units)?;
    quiz.set_mode(args.mode);
    let count = quiz.set_count(args.count);

    match quiz.start_session().await? {
        StartOutcome::Started { total, matching } => {
            println!(
                "{} mode: {total} of {matching} matching questions (asked for {count}).",
                args.mode
            );
        }
        StartOutcome::NoQuestionsMatched => {
            println!("No questions match these units and mode. Try another mode or more units.");
            return Ok(());
        }
        StartOutcome::Discarded => return Ok(()),
    }

    play(&mut quiz).await
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

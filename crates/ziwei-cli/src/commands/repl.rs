//! Interactive consultation with view switching.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::Datelike;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::sync::CancellationToken;
use ziwei_application::{ChartView, ConversationOrchestrator};
use ziwei_core::prompt::SUGGESTED_QUESTIONS;
use ziwei_core::session::{ActiveView, MessageRole, SessionEvent};
use ziwei_core::birth::selectable_years;
use ziwei_core::{BirthInput, Gender};

use super::chart::render_chart;
use super::context::AppContext;
use super::output;
use crate::BirthArgs;

const COMMANDS: &[&str] = &[
    "/view chart",
    "/view text",
    "/view analysis",
    "/view chat",
    "/analyze",
    "/birth",
    "/gender",
    "/year",
    "/now",
    "/suggest",
    "/save",
    "/help",
    "/quit",
];

const HELP: &str = "\
/view chart|text|analysis|chat   switch view
/analyze                         stream the expert report
/birth YYYY-MM-DD HH:MM [gender] change the birth data
/gender male|female              change gender only
/year YYYY                       change the birth year only
/now                             reset to the current moment
/suggest [n]                     list or ask a suggested question
/save <path>                     write the chart text to a file
/quit                            leave
Anything else is sent to the consultant.";

/// Rustyline helper completing and hinting slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Empty,
    View(ActiveView),
    Analyze,
    Birth {
        date: String,
        time: String,
        gender: Option<String>,
    },
    Gender(String),
    Year(i32),
    Now,
    Suggest(Option<usize>),
    Save(PathBuf),
    Help,
    Quit,
    Message(String),
    Invalid(String),
}

fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    if line == "quit" || line == "exit" {
        return ReplCommand::Quit;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Message(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (name, args.as_slice()) {
        ("view" | "v", [view]) => match view.parse() {
            Ok(view) => ReplCommand::View(view),
            Err(e) => ReplCommand::Invalid(e.to_string()),
        },
        ("analyze" | "a", []) => ReplCommand::Analyze,
        ("birth", [date, time]) => ReplCommand::Birth {
            date: date.to_string(),
            time: time.to_string(),
            gender: None,
        },
        ("birth", [date, time, gender]) => ReplCommand::Birth {
            date: date.to_string(),
            time: time.to_string(),
            gender: Some(gender.to_string()),
        },
        ("gender", [gender]) => ReplCommand::Gender(gender.to_string()),
        ("year", [year]) => year_choice(year, chrono::Local::now().year()),
        ("now", []) => ReplCommand::Now,
        ("suggest", []) => ReplCommand::Suggest(None),
        ("suggest", [n]) => match n.parse::<usize>() {
            Ok(n) if (1..=SUGGESTED_QUESTIONS.len()).contains(&n) => ReplCommand::Suggest(Some(n)),
            _ => ReplCommand::Invalid(format!(
                "pick a question between 1 and {}",
                SUGGESTED_QUESTIONS.len()
            )),
        },
        ("save", [path]) => ReplCommand::Save(PathBuf::from(*path)),
        ("help" | "h", []) => ReplCommand::Help,
        ("quit" | "q" | "exit", []) => ReplCommand::Quit,
        _ => ReplCommand::Invalid(format!("Unknown command: /{rest}. Type /help.")),
    }
}

/// Accepts only the years the year shortcut offers.
fn year_choice(text: &str, current_year: i32) -> ReplCommand {
    let years = selectable_years(current_year);
    match text.parse::<i32>() {
        Ok(year) if years.contains(&year) => ReplCommand::Year(year),
        Ok(_) => ReplCommand::Invalid(format!(
            "pick a year between {} and {current_year}",
            years.last().copied().unwrap_or(current_year)
        )),
        Err(_) => ReplCommand::Invalid(format!("'{text}' is not a year")),
    }
}

struct Repl<'a> {
    context: &'a AppContext,
    orchestrator: ConversationOrchestrator,
    events: UnboundedReceiver<SessionEvent>,
    view: ChartView,
}

impl Repl<'_> {
    fn show(&self) {
        match self.orchestrator.active_view() {
            ActiveView::Chart => print!("{}", render_chart(&self.view)),
            ActiveView::Text => print!("{}", self.view.text),
            ActiveView::Analysis => {
                let report = self.orchestrator.expert_report();
                if report.is_empty() {
                    println!("{}", "输入 /analyze 生成万字深度详批".bright_black());
                } else {
                    println!("{report}");
                }
            }
            ActiveView::Chat => self.show_chat(),
        }
    }

    fn show_chat(&self) {
        let session = self.orchestrator.session();
        if session.chat_log.is_empty() {
            println!("{}", "您可以问我：".bright_black());
            for (i, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
                println!("  {} {question}", format!("{}.", i + 1).bright_black());
            }
            return;
        }
        for message in &session.chat_log {
            match message.role {
                MessageRole::User => println!("{} {}", "你:".green().bold(), message.content),
                MessageRole::Assistant => {
                    println!("{} {}", "AI:".bright_blue().bold(), message.content)
                }
            }
        }
    }

    /// Recomputes the chart; the report and chat log are kept.
    async fn change_birth(&mut self, input: ziwei_core::Result<BirthInput>) -> Result<()> {
        let view = self.context.chart_view(&input?).await?;
        self.view = view;
        println!(
            "{}",
            format!(
                "命盘已更新: {} {} {}",
                self.view.input.date_string(),
                self.view.input.time_string(),
                self.view.input.gender.ephemeris_token()
            )
            .green()
        );
        if matches!(
            self.orchestrator.active_view(),
            ActiveView::Chart | ActiveView::Text
        ) {
            self.show();
        }
        Ok(())
    }

    async fn analyze(&mut self) -> Result<()> {
        self.orchestrator.set_active_view(ActiveView::Analysis);
        let cancel = CancellationToken::new();
        output::drive(
            self.orchestrator.run_expert_analysis(&self.view.text, &cancel),
            &mut self.events,
            &cancel,
        )
        .await?;
        Ok(())
    }

    async fn ask(&mut self, text: &str) -> Result<()> {
        self.orchestrator.set_active_view(ActiveView::Chat);
        println!("{} {}", "你:".green().bold(), text);
        let cancel = CancellationToken::new();
        output::drive(
            self.orchestrator.send_message(&self.view.text, text, &cancel),
            &mut self.events,
            &cancel,
        )
        .await?;
        Ok(())
    }

    /// Returns `false` when the loop should end.
    async fn dispatch(&mut self, command: ReplCommand) -> Result<bool> {
        match command {
            ReplCommand::Empty => {}
            ReplCommand::View(view) => {
                self.orchestrator.set_active_view(view);
                self.show();
            }
            ReplCommand::Analyze => self.analyze().await?,
            ReplCommand::Birth { date, time, gender } => {
                let gender = gender.unwrap_or_else(|| self.view.input.gender.to_string());
                self.change_birth(BirthInput::parse(&date, &time, &gender))
                    .await?;
            }
            ReplCommand::Gender(gender) => {
                let input = &self.view.input;
                let candidate = gender
                    .parse::<Gender>()
                    .and_then(|gender| BirthInput::new(input.solar_date, input.time, gender));
                self.change_birth(candidate).await?;
            }
            ReplCommand::Year(year) => {
                let candidate = self.view.input.with_year(year);
                self.change_birth(candidate).await?;
            }
            ReplCommand::Now => {
                let mut input = self.view.input.clone();
                input.set_to_now();
                self.change_birth(Ok(input)).await?;
            }
            ReplCommand::Suggest(None) => self.show_chat(),
            ReplCommand::Suggest(Some(n)) => self.ask(SUGGESTED_QUESTIONS[n - 1]).await?,
            ReplCommand::Save(path) => {
                std::fs::write(&path, &self.view.text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{}", format!("Chart text written to {}", path.display()).green());
            }
            ReplCommand::Help => println!("{}", HELP.bright_black()),
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Message(text) => self.ask(&text).await?,
            ReplCommand::Invalid(message) => println!("{}", message.yellow()),
        }
        Ok(true)
    }
}

pub async fn run(context: &AppContext, birth: &BirthArgs) -> Result<()> {
    let input = birth.to_input()?;
    let view = context.chart_view(&input).await?;
    let (tx, events) = mpsc::unbounded_channel();
    let mut repl = Repl {
        context,
        orchestrator: context.orchestrator(tx),
        events,
        view,
    };

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== 紫微斗数 AI 咨询 ===".bright_magenta().bold());
    println!(
        "{}",
        "Type /help for commands, /quit to exit. Ctrl-C stops a running reply.".bright_black()
    );
    println!();
    repl.show();

    loop {
        let prompt = format!("[{}] >> ", repl.orchestrator.active_view().label());
        match rl.readline(&prompt) {
            Ok(line) => {
                let command = parse_command(&line);
                if command != ReplCommand::Empty {
                    let _ = rl.add_history_entry(line.as_str());
                }
                match repl.dispatch(command).await {
                    Ok(true) => {}
                    Ok(false) => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                    Err(e) => eprintln!("{}", format!("Error: {e:#}").red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type /quit to exit.".yellow());
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        }
    }

    let session = repl.orchestrator.session();
    tracing::debug!(
        turns = session.chat_log.len(),
        report_chars = session.expert_report.chars().count(),
        "Consultation ended"
    );
    Ok(())
}

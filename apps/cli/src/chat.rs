use std::io::Write;

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use ytbuddy_core::{
    AnalysisController, BackendGateway, Mode, PlayerEmbed, Role, StatePort, Tab,
    format_chat_message, format_tab, format_transcript,
};

use crate::create_spinner;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    Mode(Option<Mode>),
    Tab(Option<Tab>),
    Show,
    Transcript,
    Back,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

pub fn parse_tab(value: &str) -> Option<Tab> {
    match value.trim().to_ascii_lowercase().as_str() {
        "summary" => Some(Tab::Summary),
        "keypoints" | "key-points" | "key_points" => Some(Tab::KeyPoints),
        _ => None,
    }
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Ask(line.to_string());
    };

    let (name, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    match name {
        "mode" => Command::Mode(Mode::from_wire(arg)),
        "tab" => Command::Tab(parse_tab(arg)),
        "show" => Command::Show,
        "transcript" => Command::Transcript,
        "back" => Command::Back,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

fn print_help() {
    println!("{}", style("Commands:").bold());
    println!("  /mode default|buddy|beyond   switch answering mode");
    println!("  /tab summary|keypoints       show a tab");
    println!("  /show                        show the current tab");
    println!("  /transcript                  show the transcript");
    println!("  /back                        clear the session and leave");
    println!("  /quit                        leave, keeping the session");
    println!("{}", style("Anything else is sent as a question.").dim());
}

fn print_mode(mode: Mode) {
    let info = mode.info();
    println!(
        "{} {} {}",
        style("Mode:").dim(),
        style(info.title).cyan().bold(),
        style(format!("- {}", info.description)).dim()
    );
    println!("{} {}", style("Example:").dim(), info.example);
}

pub fn print_message(message: &ytbuddy_core::ChatMessage) {
    let line = format_chat_message(message);
    match message.role {
        Role::User => println!("{}", style(line).yellow()),
        Role::Assistant => println!("{}", style(line).cyan()),
    }
}

pub async fn run_chat<G, P, E>(controller: &mut AnalysisController<G, P, E>) -> Result<()>
where
    G: BackendGateway,
    P: StatePort,
    E: PlayerEmbed,
{
    print_mode(controller.mode());
    println!("{}", style("Type /help for commands.").dim());
    println!("{}", style("─".repeat(60)).dim());
    for message in controller.chat() {
        print_message(message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Ask(question) => {
                let spinner = create_spinner("Thinking...");
                let added = controller.ask(&question).await;
                spinner.finish_and_clear();
                for message in added.iter().filter(|m| m.role == Role::Assistant) {
                    print_message(message);
                }
            }
            Command::Mode(Some(mode)) => {
                controller.select_mode(mode);
                print_mode(mode);
            }
            Command::Mode(None) => {
                let modes: Vec<_> = Mode::ALL.iter().map(Mode::as_str).collect();
                println!("{} {}", style("Modes:").red(), modes.join(", "));
            }
            Command::Tab(Some(tab)) => {
                controller.select_tab(tab);
                if let Some(session) = controller.session() {
                    println!("{}", format_tab(session, tab));
                }
            }
            Command::Tab(None) => println!("{}", style("Tabs: summary, keypoints").red()),
            Command::Show => {
                if let Some(session) = controller.session() {
                    println!("{}", format_tab(session, controller.tab()));
                }
            }
            Command::Transcript => {
                if let Some(session) = controller.session() {
                    println!("{}", format_transcript(session));
                }
            }
            Command::Back => {
                controller.go_back();
                println!("{} Session cleared", style("✓").green().bold());
                break;
            }
            Command::Help => print_help(),
            Command::Quit => break,
            Command::Unknown(name) => {
                println!("{} /{}", style("Unknown command:").red(), name);
            }
        }
    }

    Ok(())
}

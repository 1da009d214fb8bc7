use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use ytbuddy_core::{
    AnalysisController, Backend, ClientConfig, FileStatePort, HttpGateway, Mode, PlayerAdapter,
    Screen, SessionStore, Tab, YtBuddyError, format_key_points, format_player_status,
    format_session_readable, format_summary, format_transcript,
};

use crate::{chat::print_message, embed::OembedEmbed};

mod chat;
mod embed;
mod logger;

type Controller = AnalysisController<HttpGateway, FileStatePort, OembedEmbed>;

/// CLI wrapper for Mode enum (needed for clap ValueEnum)
#[derive(Clone, Copy, Default, ValueEnum)]
enum CliMode {
    #[default]
    Default,
    Buddy,
    Beyond,
}

impl From<CliMode> for Mode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::Default => Mode::Default,
            CliMode::Buddy => Mode::Buddy,
            CliMode::Beyond => Mode::Beyond,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum CliTab {
    #[default]
    Summary,
    Keypoints,
}

impl From<CliTab> for Tab {
    fn from(cli: CliTab) -> Self {
        match cli {
            CliTab::Summary => Tab::Summary,
            CliTab::Keypoints => Tab::KeyPoints,
        }
    }
}

#[derive(Parser)]
#[command(name = "ytbuddy")]
#[command(about = "Analyze YouTube videos and chat about their content")]
struct Cli {
    /// Backend base URL
    #[arg(long, global = true, env = "YTBUDDY_API_URL")]
    api_url: Option<String>,

    /// Use the hosted backend instead of a local one
    #[arg(long, global = true)]
    hosted: bool,

    /// Where the current analysis is stored
    #[arg(long, global = true)]
    state_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a video and make it the current session
    Analyze {
        /// Video URL
        url: String,
    },
    /// Show the current analysis
    Show {
        #[arg(short, long, default_value = "summary")]
        tab: CliTab,

        /// Also print the transcript
        #[arg(long)]
        transcript: bool,

        /// Print only the selected section's text, for piping
        #[arg(long)]
        raw: bool,
    },
    /// Ask one question about the current video
    Ask {
        question: String,

        #[arg(short, long, default_value = "default")]
        mode: CliMode,
    },
    /// Chat about the current video
    Chat {
        #[arg(short, long, default_value = "default")]
        mode: CliMode,
    },
    /// Clear the current session
    Reset,
    /// Check backend connectivity
    Health {
        /// Also fetch server usage metrics
        #[arg(long)]
        usage: bool,
    },
}

pub(crate) fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn build_controller(cli: &Cli) -> Result<Controller> {
    let backend = if cli.hosted {
        Backend::Hosted
    } else {
        Backend::Local
    };
    let config = ClientConfig::resolve(&backend, cli.api_url.as_deref());
    let gateway = HttpGateway::new(config)?;
    tracing::debug!(backend = backend.name(), base_url = gateway.base_url(), "using backend");

    let port = match &cli.state_file {
        Some(path) => FileStatePort::new(path),
        None => FileStatePort::default(),
    };

    Ok(AnalysisController::new(
        gateway,
        SessionStore::new(port),
        PlayerAdapter::new(OembedEmbed::new()),
    ))
}

fn print_header() {
    println!(
        "\n{}  {}\n",
        style("ytbuddy").cyan().bold(),
        style("Video Analysis").dim()
    );
}

fn print_analysis(controller: &Controller, tab: Tab, with_transcript: bool) {
    let Some(session) = controller.session() else {
        return;
    };
    match controller.player_status().to_error() {
        Some(err) => println!("{} {}", style("!").red().bold(), style(err).red()),
        None => println!("{}", style(format_player_status(controller.player_status())).dim()),
    }
    let tabs: Vec<String> = [Tab::Summary, Tab::KeyPoints]
        .iter()
        .map(|t| {
            if *t == tab {
                style(format!("[{}]", t.label())).cyan().bold().to_string()
            } else {
                style(t.label()).dim().to_string()
            }
        })
        .collect();
    println!("{}", tabs.join("  "));
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", format_session_readable(session, tab, with_transcript));
}

/// Open the persisted session and require the analysis screen. The player is
/// only loaded when its status will be shown.
async fn open_analysis(controller: &mut Controller, with_player: bool) -> Result<()> {
    let screen = if with_player {
        controller.open().await
    } else {
        controller.restore()
    };
    match screen {
        Screen::Analysis => Ok(()),
        Screen::Landing => Err(YtBuddyError::NoActiveSession.into()),
        Screen::NoAnalysisData => Err(YtBuddyError::NoAnalysisData.into()),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut controller = build_controller(&cli)?;

    match cli.command {
        Command::Analyze { url } => {
            print_header();
            let spinner = create_spinner("Analyzing video (transcribing and summarizing)...");
            let screen = controller.submit_url(&url).await;
            spinner.finish_and_clear();

            match screen? {
                Screen::Analysis => {
                    println!("{} Analysis ready", style("✓").green().bold());
                    print_analysis(&controller, Tab::Summary, false);
                    println!(
                        "{} {}",
                        style("Next:").dim(),
                        style("ytbuddy chat").cyan()
                    );
                }
                Screen::NoAnalysisData => {
                    println!("{} No analysis data available", style("!").red().bold());
                    println!(
                        "{} {}",
                        style("Try another video, or clear it with").dim(),
                        style("ytbuddy reset").cyan()
                    );
                }
                Screen::Landing => {}
            }
        }
        Command::Show {
            tab,
            transcript,
            raw,
        } => {
            open_analysis(&mut controller, !raw).await?;
            let tab: Tab = tab.into();
            controller.select_tab(tab);

            if raw {
                if let Some(session) = controller.session() {
                    let text = match (transcript, tab) {
                        (true, _) => format_transcript(session),
                        (false, Tab::Summary) => format_summary(session),
                        (false, Tab::KeyPoints) => format_key_points(session),
                    };
                    println!("{}", text);
                }
            } else {
                print_header();
                print_analysis(&controller, tab, transcript);
            }
        }
        Command::Ask { question, mode } => {
            if question.trim().is_empty() {
                return Err(YtBuddyError::EmptyQuestion.into());
            }
            open_analysis(&mut controller, false).await?;
            controller.select_mode(mode.into());

            let spinner = create_spinner("Thinking...");
            let added = controller.ask(&question).await.to_vec();
            spinner.finish_and_clear();
            for message in &added {
                print_message(message);
            }
        }
        Command::Chat { mode } => {
            open_analysis(&mut controller, true).await?;
            controller.select_mode(mode.into());
            print_header();
            print_analysis(&controller, controller.tab(), false);
            chat::run_chat(&mut controller).await?;
        }
        Command::Reset => {
            controller.go_back();
            println!("{} Session cleared", style("✓").green().bold());
        }
        Command::Health { usage } => {
            let health = controller.health().await;
            if health.reachable {
                println!(
                    "{} Backend reachable: {}",
                    style("✓").green().bold(),
                    style(health.status.as_deref().unwrap_or("unknown")).yellow()
                );
            } else {
                println!("{} Backend unreachable", style("✗").red().bold());
            }
            if usage {
                match controller.gateway().usage().await {
                    Some(metrics) => println!("{}", serde_json::to_string_pretty(&metrics)?),
                    None => println!("{}", style("Usage metrics unavailable").dim()),
                }
            }
            if !health.reachable {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

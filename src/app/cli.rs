use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

use crate::app::commands;
use crate::app::config::{
    config_path, data_path, load_config_from_path, save_config_to_path, AppConfig,
};
use crate::app::error::AppError;
use crate::app::form::{print_favorites, print_history, Form, NO_DEVICES_HINT};
use crate::app::logging::init_logging;
use crate::app::models::{CommandResponse, LaunchOutcome};
use crate::app::prompt::confirm;
use crate::app::state::AppState;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliOptions {
    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Print command results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the config file (JSON)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the history/favorites data file
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Defaults to the interactive form
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// List attached devices
    Devices,
    /// Check that adb resolves and runs
    CheckAdb,
    /// Send a deep-link to a device
    Launch {
        deeplink: String,
        /// Target device serial; adb picks the device when omitted
        #[arg(short, long)]
        serial: Option<String>,
    },
    /// Show, launch from or clear the launch history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Manage named favorites
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },
    /// Write history and favorites to a file
    Export { path: PathBuf },
    /// Merge history and favorites from an exported file
    Import { path: PathBuf },
    /// Interactive launcher session
    Form,
    /// Inspect or reset the configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    List,
    Launch {
        index: usize,
        #[arg(short, long)]
        serial: Option<String>,
    },
    Clear,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum FavoritesAction {
    List,
    Add {
        name: String,
        deeplink: String,
    },
    Rename {
        index: usize,
        name: String,
    },
    Delete {
        index: usize,
    },
    Clear,
    Launch {
        index: usize,
        #[arg(short, long)]
        serial: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    Show,
    Path,
    Reset,
}

pub fn parse() -> CliOptions {
    CliOptions::parse()
}

pub fn run(options: CliOptions) -> ExitCode {
    let config_file = options.config.clone().unwrap_or_else(config_path);
    let (config, config_error) = match load_config_from_path(&config_file) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    init_logging(&config.logging);
    if let Some(err) = config_error {
        warn!(path = %config_file.display(), error = %err, "config not loaded, using defaults");
    }

    let mut console = Console {
        input: io::stdin().lock(),
        out: io::stdout().lock(),
        prompts: io::stderr(),
    };
    let command = options.command.clone().unwrap_or(CliCommand::Form);
    if let CliCommand::Config { action } = &command {
        return report(run_config(
            action.unwrap_or(ConfigAction::Show),
            &config,
            &config_file,
            options.json,
            &mut console.out,
        ));
    }

    let data_file = options.data.clone().unwrap_or_else(|| data_path(&config));
    let mut state = AppState::open(config, data_file);
    report(execute(&options, command, &mut state, &mut console))
}

/// Streams a command talks to. Prompts go to their own stream so `--json`
/// output stays parseable.
pub struct Console<R, W, P> {
    pub input: R,
    pub out: W,
    pub prompts: P,
}

fn report(result: Result<(), AppError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn io_error(err: io::Error) -> AppError {
    AppError::system(format!("Terminal I/O failed: {err}"), "")
}

fn emit<T: Serialize, W: Write>(
    json: bool,
    response: &CommandResponse<T>,
    out: &mut W,
    human: impl FnOnce(&mut W) -> io::Result<()>,
) -> Result<(), AppError> {
    if json {
        let payload = serde_json::to_string_pretty(response)
            .map_err(|err| AppError::system(format!("Failed to serialize output: {err}"), ""))?;
        writeln!(out, "{payload}").map_err(io_error)
    } else {
        human(out).map_err(io_error)
    }
}

fn ask<R: BufRead, W: Write, P: Write>(
    options: &CliOptions,
    question: &str,
    console: &mut Console<R, W, P>,
) -> Result<bool, AppError> {
    confirm(options.yes, question, &mut console.input, &mut console.prompts).map_err(io_error)
}

pub fn execute<R: BufRead, W: Write, P: Write>(
    options: &CliOptions,
    command: CliCommand,
    state: &mut AppState,
    console: &mut Console<R, W, P>,
) -> Result<(), AppError> {
    let json = options.json;
    match command {
        CliCommand::Devices => {
            let response = commands::list_devices(state, None);
            emit(json, &response, &mut console.out, |out| {
                if response.data.is_empty() {
                    return writeln!(out, "{NO_DEVICES_HINT}");
                }
                for (index, device) in response.data.iter().enumerate() {
                    writeln!(out, "[{index}] {}", device.label())?;
                }
                Ok(())
            })
        }
        CliCommand::CheckAdb => {
            let response = commands::check_adb(state, None);
            emit(json, &response, &mut console.out, |out| {
                let info = &response.data;
                match (&info.command_path, &info.error) {
                    (Some(path), None) => {
                        writeln!(out, "adb: {path}")?;
                        writeln!(out, "{}", info.version_output)
                    }
                    (path, Some(error)) => writeln!(
                        out,
                        "adb unavailable ({}): {error}",
                        path.as_deref().unwrap_or("not found")
                    ),
                    (None, None) => writeln!(out, "adb unavailable"),
                }
            })?;
            if response.data.available {
                Ok(())
            } else {
                Err(AppError::dependency("adb is not available", &response.trace_id))
            }
        }
        CliCommand::Launch { deeplink, serial } => {
            let response = commands::launch_deeplink(state, serial, deeplink, None)?;
            emit(json, &response, &mut console.out, |out| print_launch(out, &response))
        }
        CliCommand::History { action } => match action.unwrap_or(HistoryAction::List) {
            HistoryAction::List => {
                let response = commands::get_links(state, None);
                emit(json, &CommandResponse {
                    trace_id: response.trace_id.clone(),
                    data: &response.data.history,
                }, &mut console.out, |out| print_history(state, out))
            }
            HistoryAction::Launch { index, serial } => {
                let response = commands::launch_history_entry(state, serial, index, None)?;
                emit(json, &response, &mut console.out, |out| print_launch(out, &response))
            }
            HistoryAction::Clear => {
                if state.store.history().is_empty() {
                    return emit(json, &commands::get_links(state, None), &mut console.out, |out| {
                        writeln!(out, "History is already empty")
                    });
                }
                if !ask(options, "Clear the history?", console)? {
                    return Ok(());
                }
                let response = commands::clear_history(state, None)?;
                emit(json, &response, &mut console.out, |out| {
                    writeln!(out, "Removed {} entries", response.data)
                })
            }
        },
        CliCommand::Favorites { action } => match action.unwrap_or(FavoritesAction::List) {
            FavoritesAction::List => {
                let response = commands::get_links(state, None);
                emit(json, &CommandResponse {
                    trace_id: response.trace_id.clone(),
                    data: &response.data.favorites,
                }, &mut console.out, |out| print_favorites(state, out))
            }
            FavoritesAction::Add { name, deeplink } => {
                let response = commands::add_favorite(state, name, deeplink, None)?;
                emit(json, &response, &mut console.out, |out| print_favorites(state, out))
            }
            FavoritesAction::Rename { index, name } => {
                let response = commands::rename_favorite(state, index, name, None)?;
                emit(json, &response, &mut console.out, |out| {
                    if response.data {
                        print_favorites(state, out)
                    } else {
                        writeln!(out, "Nothing renamed")
                    }
                })
            }
            FavoritesAction::Delete { index } => {
                let Some(favorite) = state.store.favorites().get(index).cloned() else {
                    return Err(AppError::validation(format!("No favorite #{index}"), ""));
                };
                if !ask(options, &format!("Delete favorite \"{}\"?", favorite.name), console)? {
                    return Ok(());
                }
                let response = commands::delete_favorite(state, index, None)?;
                emit(json, &response, &mut console.out, |out| print_favorites(state, out))
            }
            FavoritesAction::Clear => {
                if !ask(options, "Delete all favorites?", console)? {
                    return Ok(());
                }
                let response = commands::clear_favorites(state, None)?;
                emit(json, &response, &mut console.out, |out| {
                    writeln!(out, "Removed {} favorites", response.data)
                })
            }
            FavoritesAction::Launch { index, serial } => {
                let response = commands::launch_favorite(state, serial, index, None)?;
                emit(json, &response, &mut console.out, |out| print_launch(out, &response))
            }
        },
        CliCommand::Export { path } => {
            let response = commands::export_links(state, &path, None)?;
            emit(json, &response, &mut console.out, |out| {
                writeln!(
                    out,
                    "Exported {} history entries and {} favorites to {}",
                    response.data.history.len(),
                    response.data.favorites.len(),
                    path.display()
                )
            })
        }
        CliCommand::Import { path } => {
            let response = commands::import_links(state, &path, None)?;
            emit(json, &response, &mut console.out, |out| {
                writeln!(
                    out,
                    "Added: favorites {}, history {}",
                    response.data.favorites_added, response.data.history_added
                )
            })
        }
        CliCommand::Form => Form::new(options.yes)
            .run(state, &mut console.input, &mut console.out)
            .map_err(io_error),
        CliCommand::Config { .. } => Ok(()),
    }
}

fn print_launch<W: Write>(
    out: &mut W,
    response: &CommandResponse<LaunchOutcome>,
) -> io::Result<()> {
    let target = response.data.serial.as_deref().unwrap_or("default device");
    writeln!(out, "Launched {} on {target}", response.data.deeplink)
}

fn run_config<W: Write>(
    action: ConfigAction,
    config: &AppConfig,
    config_file: &Path,
    json: bool,
    out: &mut W,
) -> Result<(), AppError> {
    let trace_id = commands::resolve_trace_id(None);
    match action {
        ConfigAction::Show => {
            let response = CommandResponse {
                trace_id,
                data: config.clone(),
            };
            let pretty = serde_json::to_string_pretty(config)
                .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), ""))?;
            emit(json, &response, out, |out| writeln!(out, "{pretty}"))
        }
        ConfigAction::Path => {
            let response = CommandResponse {
                trace_id,
                data: serde_json::json!({
                    "config": config_file.display().to_string(),
                    "data": data_path(config).display().to_string(),
                }),
            };
            emit(json, &response, out, |out| {
                writeln!(out, "config: {}", config_file.display())?;
                writeln!(out, "data:   {}", data_path(config).display())
            })
        }
        ConfigAction::Reset => {
            let defaults = AppConfig::default();
            save_config_to_path(&defaults, config_file)
                .map_err(|err| err.with_trace_id(&trace_id))?;
            let response = CommandResponse {
                trace_id,
                data: defaults,
            };
            emit(json, &response, out, |out| {
                writeln!(out, "Config reset: {}", config_file.display())
            })
        }
    }
}

pub mod app;

use std::process::ExitCode;

pub fn run() -> ExitCode {
    app::cli::run(app::cli::parse())
}

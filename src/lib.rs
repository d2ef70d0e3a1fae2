pub mod app_error;
pub mod builder;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod environment;
pub mod execution;
pub mod locator;
pub mod model;
pub mod output;
pub mod sanitize;
pub mod version;

pub fn run() -> i32 {
    match cli::run_cli() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            err.code()
        }
    }
}

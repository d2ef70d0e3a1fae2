use crate::app_error::AppError;
use crate::builder;
use crate::config::{self, Config};
use crate::delivery::{Client, Outcome};
use crate::environment::{self, Environment};
use crate::execution::CompletedBuild;
use crate::model::{BuildRecord, BuildStatus};
use crate::output;
use crate::version;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Generator, generate};
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "./ci-insight.yml";

const DEFAULT_CONFIG_TEMPLATE: &str = r#"version: 1

api:
  url: "http://localhost:3000"
  # token: "<shared secret from the CI-Insight dashboard>"
  # timeout: "10s"
"#;

// Host variables consulted when the matching flags are absent.
const JOB_NAME_VAR: &str = "JOB_NAME";
const BUILD_NUMBER_VAR: &str = "BUILD_NUMBER";
const WORKSPACE_VAR: &str = "WORKSPACE";

#[derive(Debug, Parser)]
#[command(
    name = "ci-insight",
    version = version::VALUE,
    about = "Pushes completed CI build records to a CI-Insight endpoint",
    styles = clap_styles()
)]
struct Cli {
    #[arg(long = "no-color", global = true)]
    no_color: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Init(InitArgs),
    Push(PushArgs),
    Validate(ValidateArgs),
    Version,
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
struct InitArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct PushArgs {
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    job: Option<String>,

    #[arg(long = "build-number")]
    build_number: Option<i64>,

    #[arg(long)]
    result: Option<String>,

    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    #[arg(long)]
    workspace: Option<PathBuf>,

    #[arg(long = "script-file")]
    script_file: Option<PathBuf>,

    #[arg(long = "env-file")]
    env_file: Option<PathBuf>,

    #[arg(long = "dry-run")]
    dry_run: bool,

    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct CompletionArgs {
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn clap_styles() -> Styles {
    Styles::plain()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default())
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
        .valid(AnsiColor::Cyan.on_default())
        .invalid(AnsiColor::Cyan.on_default())
        .context(AnsiColor::White.on_default())
        .context_value(AnsiColor::Cyan.on_default())
}

pub fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    output::configure(cli.no_color);

    match cli.command {
        Commands::Init(args) => run_init(args),
        Commands::Push(args) => run_push(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Version => {
            println!("{}", version::VALUE);
            Ok(())
        }
        Commands::Completion(args) => run_completion(args),
    }
}

fn run_init(args: InitArgs) -> Result<(), AppError> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if config_path.exists() && !args.force {
        return Err(AppError::usage(format!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        )));
    }

    fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)
        .map_err(|e| AppError::internal(format!("write {}: {e}", config_path.display())))?;

    println!(
        "created {}",
        output::highlight(&config_path.display().to_string())
    );
    Ok(())
}

fn run_push(args: PushArgs) -> Result<(), AppError> {
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let cfg = maybe_load_config(&config_path, args.config.is_some())?.unwrap_or_default();
    let mut settings = cfg.resolve_delivery_settings().map_err(AppError::usage)?;
    settings.apply_env_overrides();

    let build = CompletedBuild {
        job_name: resolve_job(args.job)?,
        number: resolve_build_number(args.build_number)?,
        result: resolve_result(args.result.as_deref())?,
        log_file: args.log_file,
        workspace: resolve_workspace(args.workspace),
        script_file: args.script_file,
    };

    let mut env = Environment::from_process();
    if let Some(path) = &args.env_file {
        env.overlay(load_env_file(path)?);
    }

    // Extraction failures never fail the host's build step: warn and exit
    // clean, sending nothing.
    let record = match builder::build(&build, &env) {
        Ok(record) => record,
        Err(err) => {
            eprintln!("{} failed to gather build data: {err}", output::warn());
            return Ok(());
        }
    };

    if args.dry_run {
        return write_json(&record)
            .map_err(|e| AppError::internal(format!("encode payload json: {e}")));
    }

    let outcome = Client::new(&settings).send(&record);

    if args.json {
        return write_push_json(&record, &outcome)
            .map_err(|e| AppError::internal(format!("encode push json: {e}")));
    }

    if matches!(outcome, Outcome::Delivered) {
        println!(
            "{} delivered {} {} ({})",
            output::ok(),
            record.repository,
            output::highlight(&format!("#{}", record.build_number)),
            record.status
        );
    }

    Ok(())
}

fn write_json<T: Serialize>(value: &T) -> Result<(), io::Error> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}

#[derive(Serialize)]
struct PushReport<'a> {
    repository: &'a str,
    build_number: &'a str,
    status: &'a str,
    outcome: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn write_push_json(record: &BuildRecord, outcome: &Outcome) -> Result<(), io::Error> {
    write_json(&PushReport {
        repository: &record.repository,
        build_number: &record.build_number,
        status: record.status.as_str(),
        outcome: outcome.label(),
        http_status: match outcome {
            Outcome::Rejected(code) => Some(*code),
            _ => None,
        },
        error: match outcome {
            Outcome::TransportFailed(err) => Some(err.to_string()),
            _ => None,
        },
    })
}

fn resolve_job(flag: Option<String>) -> Result<String, AppError> {
    if let Some(job) = flag {
        return Ok(job);
    }

    match std::env::var(JOB_NAME_VAR) {
        Ok(name) if !name.is_empty() => Ok(name),
        _ => Err(AppError::usage(format!(
            "a job name is required (--job or the {JOB_NAME_VAR} variable)"
        ))),
    }
}

fn resolve_build_number(flag: Option<i64>) -> Result<i64, AppError> {
    if let Some(number) = flag {
        return Ok(number);
    }

    match std::env::var(BUILD_NUMBER_VAR) {
        Ok(text) if !text.is_empty() => text.parse().map_err(|_| {
            AppError::usage(format!("invalid {BUILD_NUMBER_VAR} value {text:?}"))
        }),
        _ => Err(AppError::usage(format!(
            "a build number is required (--build-number or the {BUILD_NUMBER_VAR} variable)"
        ))),
    }
}

fn resolve_result(flag: Option<&str>) -> Result<Option<BuildStatus>, AppError> {
    flag.map(|text| text.parse::<BuildStatus>().map_err(AppError::usage))
        .transpose()
}

fn resolve_workspace(flag: Option<PathBuf>) -> Option<PathBuf> {
    if flag.is_some() {
        return flag;
    }

    std::env::var_os(WORKSPACE_VAR)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn load_env_file(path: &Path) -> Result<HashMap<String, String>, AppError> {
    match environment::load(path) {
        Ok(vars) => Ok(vars),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(AppError::usage(format!(
            "env file {} not found",
            output::highlight(&path.display().to_string())
        ))),
        Err(err) => Err(AppError::usage(format!(
            "load env file {}: {}",
            output::highlight(&path.display().to_string()),
            err
        ))),
    }
}

fn maybe_load_config(path: &Path, explicit: bool) -> Result<Option<Config>, AppError> {
    if !path.exists() {
        if explicit {
            return Err(AppError::usage(format!(
                "config file {} not found",
                output::highlight(&path.display().to_string())
            )));
        }
        return Ok(None);
    }

    let cfg = load_config_classified(path)?;
    Ok(Some(cfg))
}

fn load_config_classified(path: &Path) -> Result<Config, AppError> {
    config::load(path).map_err(|err| {
        if err.starts_with("read config:") && !err.contains("No such file") {
            AppError::internal(err)
        } else {
            AppError::usage(err)
        }
    })
}

#[derive(Serialize)]
struct ValidateIssue<'a> {
    field: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct ValidateReport<'a> {
    valid: bool,
    config: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    issues: Option<Vec<ValidateIssue<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

fn write_validate_json(report: &ValidateReport<'_>) -> Result<(), AppError> {
    write_json(report).map_err(|e| AppError::internal(format!("encode validate json: {e}")))
}

fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    let config_path = args
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config_text = config_path.display().to_string();

    let cfg = match config::parse(&config_path) {
        Ok(cfg) => cfg,
        Err(err) => {
            if args.json {
                write_validate_json(&ValidateReport {
                    valid: false,
                    config: &config_text,
                    issues: None,
                    error: Some(&err),
                })?;
            }
            return Err(AppError::usage(err));
        }
    };

    match config::validate(&cfg) {
        Ok(()) => {
            if args.json {
                write_validate_json(&ValidateReport {
                    valid: true,
                    config: &config_text,
                    issues: None,
                    error: None,
                })?;
            } else {
                println!("valid {}", output::highlight(&config_text));
            }
            Ok(())
        }
        Err(err) => {
            let message = err.to_string();
            if args.json {
                let issues = err
                    .issues
                    .iter()
                    .map(|issue| ValidateIssue {
                        field: &issue.field,
                        message: &issue.message,
                    })
                    .collect();
                write_validate_json(&ValidateReport {
                    valid: false,
                    config: &config_text,
                    issues: Some(issues),
                    error: Some(&message),
                })?;
            }
            Err(AppError::usage(message))
        }
    }
}

fn run_completion(args: CompletionArgs) -> Result<(), AppError> {
    let mut cmd = Cli::command();
    let mut stdout = io::stdout().lock();

    match args.shell {
        Shell::Bash => generate_completion(clap_complete::shells::Bash, &mut cmd, &mut stdout),
        Shell::Zsh => generate_completion(clap_complete::shells::Zsh, &mut cmd, &mut stdout),
        Shell::Fish => generate_completion(clap_complete::shells::Fish, &mut cmd, &mut stdout),
        Shell::Powershell => {
            generate_completion(clap_complete::shells::PowerShell, &mut cmd, &mut stdout)
        }
    }
    .map_err(|e| AppError::internal(format!("generate completion: {e}")))
}

fn generate_completion<G: Generator>(
    generator: G,
    cmd: &mut clap::Command,
    writer: &mut impl Write,
) -> Result<(), io::Error> {
    generate(generator, cmd, "ci-insight", writer);
    writer.flush()
}

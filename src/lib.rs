pub mod config;
pub mod diagnostics;
pub mod error;
pub mod generator;
pub mod host;
pub mod naming;
pub mod plugin;

pub use diagnostics::{Diagnostic, Diagnostics, LogDiagnostics};
pub use error::PluginError;
pub use generator::{
    Declaration, GeneratedRuleSet, ThemeSection, UtilityOptions, UtilitySpec, generate,
};
pub use host::{ConfigHost, HostError, escape_selector};
pub use plugin::{AddUtilitiesOptions, Call, CustomNative, PluginContext, apply_from_theme};

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};

const DEFAULT_CONFIG_PATH: &str = "tailwind.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Build {
        config: Option<String>,
        out: Option<String>,
        minify: bool,
    },
    Watch {
        config: Option<String>,
        out: Option<String>,
        minify: bool,
        poll: bool,
        poll_interval_ms: u64,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    pub message: String,
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError {
            message: err.message,
        }
    }
}

impl From<HostError> for CliError {
    fn from(err: HostError) -> Self {
        CliError {
            message: err.message,
        }
    }
}

impl From<PluginError> for CliError {
    fn from(err: PluginError) -> Self {
        CliError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub css: String,
    pub rule_count: usize,
}

/// Runs the `customUtilities` of `config` through the plugin and renders the
/// registered utilities.
pub fn build_css(
    config: &config::Config,
    minify: bool,
    diagnostics: &mut dyn Diagnostics,
) -> Result<GenerationResult, CliError> {
    let mut host = ConfigHost::new(config);
    apply_from_theme(&mut host, diagnostics)?;
    let css = host.emit_css(minify)?;
    Ok(GenerationResult {
        css,
        rule_count: host.rule_count(),
    })
}

pub fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Build {
            config,
            out,
            minify,
        } => run_build(config, out, minify),
        Command::Watch {
            config,
            out,
            minify,
            poll,
            poll_interval_ms,
        } => run_watch(WatchOptions {
            config,
            out,
            minify,
            poll,
            poll_interval_ms,
        }),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

pub fn run_from_env() -> Result<(), CliError> {
    let command = parse_args(env::args().skip(1))?;
    run(command)
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let Some(cmd) = iter.next() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "build" => parse_build_args(iter.collect()),
        "watch" => parse_watch_args(iter.collect()),
        "-h" | "--help" | "help" => Ok(Command::Help),
        _ => Err(CliError {
            message: format!("unknown command: {}", cmd),
        }),
    }
}

fn parse_build_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut config = None;
    let mut out = None;
    let mut minify = false;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--out" | "--output" | "-o" => {
                out = Some(flag_value(&args, &mut idx, "build", "--output")?);
            }
            "--config" | "-c" => {
                config = Some(flag_value(&args, &mut idx, "build", "--config")?);
            }
            "--minify" => {
                minify = true;
            }
            "--poll" | "--poll-interval" => {
                return Err(CliError {
                    message: format!("{} is only supported with watch", args[idx]),
                });
            }
            value => {
                return Err(CliError {
                    message: format!("unexpected build argument: {}", value),
                });
            }
        }
        idx += 1;
    }

    Ok(Command::Build {
        config,
        out,
        minify,
    })
}

fn parse_watch_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut config = None;
    let mut out = None;
    let mut minify = false;
    let mut poll = false;
    let mut poll_interval_ms = 500;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--out" | "--output" | "-o" => {
                out = Some(flag_value(&args, &mut idx, "watch", "--output")?);
            }
            "--config" | "-c" => {
                config = Some(flag_value(&args, &mut idx, "watch", "--config")?);
            }
            "--minify" => {
                minify = true;
            }
            "--poll" => {
                poll = true;
            }
            "--poll-interval" => {
                let value = flag_value(&args, &mut idx, "watch", "--poll-interval")?;
                poll = true;
                poll_interval_ms = parse_u64_arg(&value, "--poll-interval")?;
            }
            value => {
                return Err(CliError {
                    message: format!("unexpected watch argument: {}", value),
                });
            }
        }
        idx += 1;
    }

    Ok(Command::Watch {
        config,
        out,
        minify,
        poll,
        poll_interval_ms,
    })
}

fn flag_value(
    args: &[String],
    idx: &mut usize,
    command: &str,
    flag: &str,
) -> Result<String, CliError> {
    *idx += 1;
    args.get(*idx).cloned().ok_or_else(|| CliError {
        message: format!("{} requires a value for {}", command, flag),
    })
}

fn parse_u64_arg(value: &str, flag: &str) -> Result<u64, CliError> {
    value.parse::<u64>().map_err(|_| CliError {
        message: format!("{} requires a positive integer, got '{}'", flag, value),
    })
}

fn run_build(
    config_path: Option<String>,
    out: Option<String>,
    minify: bool,
) -> Result<(), CliError> {
    let config_path = config_path.unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = config::load(Path::new(&config_path))?;
    let mut diagnostics = LogDiagnostics;
    let generation = build_css(&config, minify, &mut diagnostics)?;

    let header = build_header(&config_path, generation.rule_count, minify);
    let css = if minify {
        format!("{}{}", header, generation.css)
    } else {
        format!("{}\n{}\n", header, generation.css)
    };

    if let Some(out_path) = out {
        fs::write(&out_path, css).map_err(|err| CliError {
            message: format!("failed to write output {}: {}", out_path, err),
        })?;
        log::info!("wrote {}", out_path);
    } else {
        print!("{}", css);
    }

    log::info!(
        "generated {} custom utilities from {}",
        generation.rule_count,
        config_path
    );

    Ok(())
}

fn print_help() {
    println!("custom_native");
    println!();
    println!("USAGE:");
    println!("  custom_native build [--minify] [--out <path>] [--config <path>]");
    println!("  custom_native watch [--minify] [--out <path>] [--config <path>] [--poll] [--poll-interval <ms>]");
    println!();
    println!("The config defaults to {}.", DEFAULT_CONFIG_PATH);
    println!();
    println!("EXAMPLES:");
    println!("  custom_native build --out dist/utilities.css");
    println!("  custom_native build -c theme.toml --minify");
    println!("  custom_native watch -c theme.toml --out dist/utilities.css");
    println!("  custom_native watch --poll --poll-interval 250 --out dist/utilities.css");
}

fn build_header(config_path: &str, rule_count: usize, minify: bool) -> String {
    if minify {
        return format!(
            "/* custom_native | config:{} | utilities:{} */",
            config_path, rule_count
        );
    }
    format!(
        "/*\n  custom_native\n  config: {}\n  utilities: {}\n*/",
        config_path, rule_count
    )
}

struct WatchOptions {
    config: Option<String>,
    out: Option<String>,
    minify: bool,
    poll: bool,
    poll_interval_ms: u64,
}

fn run_watch(options: WatchOptions) -> Result<(), CliError> {
    let WatchOptions {
        config,
        out,
        minify,
        poll,
        poll_interval_ms,
    } = options;

    run_build(config.clone(), out.clone(), minify)?;

    let config_path = PathBuf::from(
        config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
    );
    let (tx, rx) = channel();
    let mut watcher: Box<dyn notify::Watcher> = if poll {
        Box::new(
            notify::PollWatcher::new(
                tx,
                notify::Config::default()
                    .with_poll_interval(Duration::from_millis(poll_interval_ms)),
            )
            .map_err(|err| CliError {
                message: format!("failed to start poll watcher: {}", err),
            })?,
        )
    } else {
        Box::new(notify::recommended_watcher(tx).map_err(|err| CliError {
            message: format!("failed to start watcher: {}", err),
        })?)
    };

    let root = watch_root(&config_path);
    watcher
        .watch(&root, notify::RecursiveMode::NonRecursive)
        .map_err(|err| CliError {
            message: format!("failed to watch {}: {}", root.display(), err),
        })?;

    if poll {
        log::info!(
            "watching {} for changes (polling, press Ctrl+C to stop)...",
            config_path.display()
        );
    } else {
        log::info!(
            "watching {} for changes (press Ctrl+C to stop)...",
            config_path.display()
        );
    }

    let mut debounce = RebuildDebounce::default();
    loop {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(Ok(event)) => {
                if touches_config(&event, &config_path) {
                    debounce.record(Instant::now());
                }
            }
            Ok(Err(err)) => log::error!("watch error: {}", err),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
            Err(_) => break,
        }

        if debounce.take_due(Instant::now()) {
            log::info!("change detected, rebuilding...");
            if let Err(err) = run_build(config.clone(), out.clone(), minify) {
                log::error!("build failed: {}", err.message);
            }
        }
    }

    Ok(())
}

const REBUILD_QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Trailing-edge debounce: a rebuild is due once no change has been seen for
/// [`REBUILD_QUIET_PERIOD`]. Bursts (truncate then write) collapse into one
/// rebuild that reads the final file.
#[derive(Debug, Default)]
struct RebuildDebounce {
    pending_since: Option<Instant>,
}

impl RebuildDebounce {
    fn record(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    fn take_due(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(last) if now.saturating_duration_since(last) >= REBUILD_QUIET_PERIOD => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }
}

/// Directory to watch for a config file; editors often replace files rather
/// than writing in place.
fn watch_root(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn touches_config(event: &notify::Event, config_path: &Path) -> bool {
    let Some(file_name) = config_path.file_name() else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|path| path.file_name() == Some(file_name))
}

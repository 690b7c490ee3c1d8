//! deskshell interactive entry point.
//!
//! Reads one command line at a time from stdin, dispatches it through the
//! built-in command registry and prints the result. `exit` or `quit` (or
//! EOF) leaves the loop.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use deskshell_platform::DesktopPlatform;
use deskshell_terminal::{CommandRegistry, Environment, InvocationResult, register_builtins};
use deskshell_types::config::{OutputFormat, ShellConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    install_panic_hook();

    // Resolve config from CLI arg, DESKSHELL_CONFIG env var, or defaults.
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DESKSHELL_CONFIG").ok())
        .map(PathBuf::from);
    let config = match &config_path {
        Some(path) => ShellConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ShellConfig::default(),
    };
    log::info!(
        "Starting deskshell as {}@{} ({} apps)",
        config.user,
        config.hostname,
        config.apps.len()
    );

    let platform = build_platform(&config)?;
    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry, &config).context("failed to register commands")?;
    registry.seal();
    log::info!("Registered {} commands", registry.len());

    let env = Environment::with_platform(&config, &platform);
    run_loop(&registry, &env, &config, io::stdin().lock(), io::stdout().lock())?;

    log::info!("deskshell shut down.");
    Ok(())
}

/// Route panic reports through the logger instead of raw stderr.
///
/// Handler panics are already caught and reported as failed results, so the
/// default hook's `thread 'main' panicked at` banner would only duplicate
/// them in the middle of the prompt.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| log::debug!("panic: {info}")));
}

/// Desktop services with the configured apps and startup notifications.
fn build_platform(config: &ShellConfig) -> Result<DesktopPlatform> {
    let platform = DesktopPlatform::new(&config.apps);
    for n in &config.notifications {
        platform
            .post(&n.app, &n.title, &n.text)
            .with_context(|| format!("failed to post notification '{}'", n.title))?;
    }
    Ok(platform)
}

/// Read-dispatch-print until EOF or `exit`/`quit`.
fn run_loop(
    registry: &CommandRegistry,
    env: &Environment<'_>,
    config: &ShellConfig,
    input: impl BufRead,
    mut out: impl Write,
) -> Result<()> {
    let interactive = config.output == OutputFormat::Text;
    if interactive {
        write!(out, "{}", config.prompt)?;
        out.flush()?;
    }

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        if !trimmed.is_empty() {
            let result = registry.execute_line(env, trimmed);
            print_result(&mut out, &result, config.output)?;
        }
        if interactive {
            write!(out, "{}", config.prompt)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn print_result(out: &mut impl Write, result: &InvocationResult, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", result.to_json()?)?,
        OutputFormat::Text if result.text.is_empty() => {},
        OutputFormat::Text => writeln!(out, "{}", result.text)?,
    }
    Ok(())
}

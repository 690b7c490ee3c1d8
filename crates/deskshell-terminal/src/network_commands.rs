//! Network commands: wifi, ping.

use std::time::Duration;

use deskshell_platform::format_mac;
use deskshell_types::error::{Result, ShellError};

use crate::binder::BoundArguments;
use crate::command::{CommandOutput, CommandSpec};
use crate::environment::{Capability, Environment};
use crate::param::ParameterSpec;

/// Upper bound on probes per `ping`.
const MAX_PING_COUNT: i64 = 20;

pub(crate) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::builder("wifi")
            .description("Show or toggle WiFi")
            .category("network")
            .requires(Capability::Network)
            .parameter(
                ParameterSpec::enumeration("action", &["status", "on", "off"])
                    .default_value("status"),
            )
            .example("wifi")
            .example("wifi off")
            .build(wifi),
        CommandSpec::builder("ping")
            .description("Check reachability of a host")
            .category("network")
            .requires(Capability::Network)
            .parameter(
                ParameterSpec::string("host")
                    .required()
                    .describe("Hostname or IP address"),
            )
            .parameter(
                ParameterSpec::integer("count")
                    .default_value("4")
                    .describe("Number of probes (1-20)"),
            )
            .example("ping 8.8.8.8")
            .example("ping --count=10 google.com")
            .build(ping),
    ]
}

// ---------------------------------------------------------------------------
// wifi
// ---------------------------------------------------------------------------

fn wifi(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let network = env.require_network()?;
    match args.require("action")? {
        "on" => {
            network.set_wifi_enabled(true)?;
            Ok(CommandOutput::Text("WiFi enabled".to_string()))
        },
        "off" => {
            network.set_wifi_enabled(false)?;
            Ok(CommandOutput::Text("WiFi disabled".to_string()))
        },
        _ => {
            let info = network.wifi_info()?;
            let mut lines = vec![format!("WiFi: {}", if info.enabled { "on" } else { "off" })];
            if info.connected {
                if let Some(ssid) = &info.ssid {
                    lines.push(format!("Network: {ssid}"));
                }
                if let Some(ip) = &info.ip_address {
                    lines.push(format!("IP: {ip}"));
                }
                if let Some(dbm) = info.signal_dbm {
                    lines.push(format!("Signal: {dbm} dBm"));
                }
            } else if info.enabled {
                lines.push("Status: disconnected".to_string());
            }
            lines.push(format!("MAC: {}", format_mac(&info.mac_address)));
            Ok(CommandOutput::Text(lines.join("\n")))
        },
    }
}

// ---------------------------------------------------------------------------
// ping
// ---------------------------------------------------------------------------

fn ping(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let network = env.require_network()?;
    let host = args.require("host")?;
    let count = args.get_int("count").unwrap_or(4);
    if !(1..=MAX_PING_COUNT).contains(&count) {
        return Err(ShellError::Command(format!(
            "count must be between 1 and {MAX_PING_COUNT}, got {count}"
        )));
    }
    let timeout = Duration::from_millis(env.config.probe_timeout_ms);

    let mut lines = vec![format!("PING {host}")];
    let mut times = Vec::new();
    for seq in 1..=count {
        match network.probe(host, timeout) {
            Ok(rtt) => {
                let ms = rtt.as_secs_f64() * 1000.0;
                lines.push(format!("reply from {host}: seq={seq} time={ms:.1} ms"));
                times.push(ms);
            },
            Err(e) => {
                log::debug!("Probe {seq} to {host} failed: {e}");
                lines.push(format!("no reply from {host}: seq={seq} ({e})"));
            },
        }
    }

    if times.is_empty() {
        return Err(ShellError::Platform(format!(
            "{host} is unreachable ({count} probes failed)"
        )));
    }

    let received = times.len();
    let loss = (count as usize - received) * 100 / count as usize;
    let min = times.iter().copied().fold(f64::INFINITY, f64::min);
    let max = times.iter().copied().fold(0.0, f64::max);
    let avg = times.iter().sum::<f64>() / received as f64;
    lines.push(format!("--- {host} ping statistics ---"));
    lines.push(format!("{count} probes, {received} replies, {loss}% loss"));
    lines.push(format!("rtt min/avg/max = {min:.1}/{avg:.1}/{max:.1} ms"));
    Ok(CommandOutput::Text(lines.join("\n")))
}

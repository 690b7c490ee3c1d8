//! System commands: echo, date, uptime, battery, sysinfo.

use deskshell_types::error::Result;

use crate::binder::BoundArguments;
use crate::command::{CommandOutput, CommandSpec};
use crate::environment::{Capability, Environment};
use crate::param::ParameterSpec;

pub(crate) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::builder("echo")
            .alias("print")
            .description("Print arguments")
            .parameter(ParameterSpec::string("text").rest().describe("Text to print"))
            .example("echo hello world")
            .build(echo),
        CommandSpec::builder("date")
            .alias("time")
            .description("Show the current date and time")
            .category("system")
            .requires(Capability::Time)
            .build(date),
        CommandSpec::builder("uptime")
            .description("Show system uptime")
            .category("system")
            .requires(Capability::Time)
            .build(uptime),
        CommandSpec::builder("battery")
            .alias("power")
            .description("Show power/battery status")
            .category("system")
            .requires(Capability::Power)
            .build(battery),
        CommandSpec::builder("sysinfo")
            .alias("neofetch")
            .description("Summarise the device")
            .category("system")
            .build(sysinfo),
    ]
}

// ---------------------------------------------------------------------------
// echo
// ---------------------------------------------------------------------------

fn echo(_env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    Ok(CommandOutput::Text(args.get("text").unwrap_or("").to_string()))
}

// ---------------------------------------------------------------------------
// date
// ---------------------------------------------------------------------------

fn date(env: &Environment<'_>, _args: &BoundArguments) -> Result<CommandOutput> {
    let now = env.require_time()?.now()?;
    Ok(CommandOutput::Text(now.to_string()))
}

// ---------------------------------------------------------------------------
// uptime
// ---------------------------------------------------------------------------

fn uptime(env: &Environment<'_>, _args: &BoundArguments) -> Result<CommandOutput> {
    let secs = env.require_time()?.uptime_secs()?;
    Ok(CommandOutput::Text(format!("up {}", format_uptime(secs))))
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;
    let s = secs % 60;
    if days > 0 {
        format!("{days} day(s), {hours:02}:{mins:02}:{s:02}")
    } else {
        format!("{hours:02}:{mins:02}:{s:02}")
    }
}

// ---------------------------------------------------------------------------
// battery
// ---------------------------------------------------------------------------

fn battery(env: &Environment<'_>, _args: &BoundArguments) -> Result<CommandOutput> {
    let info = env.require_power()?.power_info()?;
    let mut lines = vec![format!("State: {}", info.state)];
    match info.battery_percent {
        Some(pct) => lines.push(format!("Battery: {pct}%")),
        None => lines.push("Battery: N/A".to_string()),
    }
    if let Some(mins) = info.battery_minutes {
        lines.push(format!("Remaining: {}h {:02}m", mins / 60, mins % 60));
    }
    if info.power_saver {
        lines.push("Power saver: on".to_string());
    }
    Ok(CommandOutput::Text(lines.join("\n")))
}

// ---------------------------------------------------------------------------
// sysinfo
// ---------------------------------------------------------------------------

/// Only reports on the services that are attached.
fn sysinfo(env: &Environment<'_>, _args: &BoundArguments) -> Result<CommandOutput> {
    let mut lines = vec![
        format!("{}@{}", env.config.user, env.config.hostname),
        "-".repeat(env.config.user.len() + env.config.hostname.len() + 1),
    ];
    if let Some(time) = env.time {
        lines.push(format!("Date:      {}", time.now()?));
        lines.push(format!("Uptime:    {}", format_uptime(time.uptime_secs()?)));
    }
    if let Some(power) = env.power {
        let info = power.power_info()?;
        let charge = info
            .battery_percent
            .map_or_else(|| "N/A".to_string(), |pct| format!("{pct}%"));
        lines.push(format!("Battery:   {charge} ({})", info.state));
    }
    if let Some(network) = env.network {
        let wifi = network.wifi_info()?;
        let status = match (wifi.enabled, wifi.connected, &wifi.ssid) {
            (false, _, _) => "off".to_string(),
            (true, true, Some(ssid)) => format!("connected to {ssid}"),
            (true, true, None) => "connected".to_string(),
            (true, false, _) => "disconnected".to_string(),
        };
        lines.push(format!("WiFi:      {status}"));
    }
    if let Some(bluetooth) = env.bluetooth {
        let adapter = bluetooth.adapter_info()?;
        lines.push(format!(
            "Bluetooth: {}",
            if adapter.enabled { "on" } else { "off" }
        ));
    }
    if let Some(packages) = env.packages {
        lines.push(format!("Apps:      {} installed", packages.installed_apps()?.len()));
    }
    if let Some(notifications) = env.notifications {
        let dnd = if notifications.do_not_disturb()? {
            ", do not disturb"
        } else {
            ""
        };
        lines.push(format!(
            "Notices:   {}{dnd}",
            notifications.notifications()?.len()
        ));
    }
    Ok(CommandOutput::Text(lines.join("\n")))
}

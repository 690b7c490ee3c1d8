//! Bluetooth commands: bluetooth, bt-connect.

use deskshell_platform::{format_mac, parse_mac};
use deskshell_types::error::{Result, ShellError};

use crate::binder::BoundArguments;
use crate::command::{CommandOutput, CommandSpec};
use crate::environment::{Capability, Environment};
use crate::param::ParameterSpec;

pub(crate) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::builder("bluetooth")
            .alias("bt")
            .description("Show or toggle Bluetooth, list paired devices")
            .category("bluetooth")
            .requires(Capability::Bluetooth)
            .parameter(
                ParameterSpec::enumeration("action", &["status", "on", "off", "devices"])
                    .default_value("status"),
            )
            .example("bt devices")
            .build(bluetooth),
        CommandSpec::builder("bt-connect")
            .description("Connect to a paired device")
            .category("bluetooth")
            .requires(Capability::Bluetooth)
            .parameter(
                ParameterSpec::mac_address("address")
                    .required()
                    .describe("Device address, as listed by 'bt devices'"),
            )
            .example("bt-connect AA:BB:CC:DD:EE:01")
            .build(bt_connect),
    ]
}

// ---------------------------------------------------------------------------
// bluetooth
// ---------------------------------------------------------------------------

fn bluetooth(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let bt = env.require_bluetooth()?;
    match args.require("action")? {
        "on" => {
            bt.set_enabled(true)?;
            Ok(CommandOutput::Text("Bluetooth enabled".to_string()))
        },
        "off" => {
            bt.set_enabled(false)?;
            Ok(CommandOutput::Text("Bluetooth disabled".to_string()))
        },
        "devices" => {
            let devices = bt.paired_devices()?;
            if devices.is_empty() {
                return Ok(CommandOutput::Text("No paired devices".to_string()));
            }
            Ok(CommandOutput::Table {
                headers: vec!["Name".into(), "Address".into(), "Status".into()],
                rows: devices
                    .iter()
                    .map(|d| {
                        vec![
                            d.name.clone(),
                            format_mac(&d.address),
                            if d.connected { "connected" } else { "paired" }.to_string(),
                        ]
                    })
                    .collect(),
            })
        },
        _ => {
            let info = bt.adapter_info()?;
            let paired = bt.paired_devices()?;
            let connected = paired.iter().filter(|d| d.connected).count();
            Ok(CommandOutput::Text(format!(
                "Bluetooth: {}\nName: {}\nAddress: {}\nPaired: {} ({connected} connected)",
                if info.enabled { "on" } else { "off" },
                info.name,
                format_mac(&info.address),
                paired.len(),
            )))
        },
    }
}

// ---------------------------------------------------------------------------
// bt-connect
// ---------------------------------------------------------------------------

fn bt_connect(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let bt = env.require_bluetooth()?;
    let text = args.require("address")?;
    let address = parse_mac(text)
        .ok_or_else(|| ShellError::Command(format!("invalid address: {text}")))?;

    if !bt.adapter_info()?.enabled {
        return Err(ShellError::Platform("Bluetooth is off".to_string()));
    }
    let device = bt
        .paired_devices()?
        .into_iter()
        .find(|d| d.address == address)
        .ok_or_else(|| ShellError::Command(format!("{text} is not a paired device")))?;
    if device.connected {
        return Ok(CommandOutput::Text(format!("Already connected to {}", device.name)));
    }
    bt.connect(address)?;
    log::info!("Connected Bluetooth device {}", device.name);
    Ok(CommandOutput::Text(format!("Connected to {} ({text})", device.name)))
}

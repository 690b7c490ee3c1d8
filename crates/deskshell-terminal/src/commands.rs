//! Built-in commands for the deskshell terminal.

use deskshell_types::config::ShellConfig;

use crate::registry::{CommandRegistry, ConfigurationError};
use crate::{
    app_commands, bluetooth_commands, network_commands, notification_commands, system_commands,
};

/// Register every built-in command that configuration has not disabled.
///
/// Stops at the first registration error; the registry keeps whatever was
/// registered before it.
pub fn register_builtins(
    reg: &mut CommandRegistry,
    config: &ShellConfig,
) -> Result<(), ConfigurationError> {
    let specs = system_commands::commands()
        .into_iter()
        .chain(network_commands::commands())
        .chain(bluetooth_commands::commands())
        .chain(app_commands::commands())
        .chain(notification_commands::commands());

    for spec in specs {
        if config.is_disabled(spec.name()) {
            log::debug!("Skipping disabled command '{}'", spec.name());
            continue;
        }
        reg.register(spec)?;
    }
    Ok(())
}

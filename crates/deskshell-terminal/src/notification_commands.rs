//! Notification commands: notifications, dnd.

use deskshell_types::error::{Result, ShellError};

use crate::binder::BoundArguments;
use crate::command::{CommandOutput, CommandSpec};
use crate::environment::{Capability, Environment};
use crate::param::ParameterSpec;

pub(crate) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::builder("notifications")
            .alias("notifs")
            .description("List active notifications, newest first")
            .category("notifications")
            .requires(Capability::Notifications)
            .parameter(
                ParameterSpec::integer("limit")
                    .default_value("10")
                    .describe("Maximum number shown"),
            )
            .parameter(
                ParameterSpec::package("app")
                    .named_only()
                    .describe("Only show notifications from this package"),
            )
            .example("notifs 3")
            .example("notifications --app=org.example.mail")
            .build(notifications),
        CommandSpec::builder("dnd")
            .description("Show or set do-not-disturb")
            .category("notifications")
            .requires(Capability::Notifications)
            .parameter(ParameterSpec::boolean("enabled"))
            .example("dnd on")
            .build(dnd),
    ]
}

// ---------------------------------------------------------------------------
// notifications
// ---------------------------------------------------------------------------

fn notifications(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let service = env.require_notifications()?;
    let limit = args.get_int("limit").unwrap_or(10);
    let limit = usize::try_from(limit)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ShellError::Command(format!("limit must be positive, got {limit}")))?;
    let app = args.get("app");

    let list: Vec<_> = service
        .notifications()?
        .into_iter()
        .filter(|n| app.is_none_or(|pkg| n.app == pkg))
        .collect();

    let mut lines = Vec::new();
    if service.do_not_disturb()? {
        lines.push("(do not disturb is on)".to_string());
    }
    if list.is_empty() {
        lines.push("No notifications".to_string());
        return Ok(CommandOutput::Text(lines.join("\n")));
    }
    for n in list.iter().take(limit) {
        lines.push(format!(
            "[{:02}:{:02}] {}: {} - {}",
            n.posted.hour, n.posted.minute, n.app, n.title, n.text
        ));
    }
    if list.len() > limit {
        lines.push(format!("... and {} more", list.len() - limit));
    }
    Ok(CommandOutput::Text(lines.join("\n")))
}

// ---------------------------------------------------------------------------
// dnd
// ---------------------------------------------------------------------------

fn dnd(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let service = env.require_notifications()?;
    let label = |on: bool| if on { "on" } else { "off" };
    match args.get_bool("enabled") {
        Some(enabled) => {
            service.set_do_not_disturb(enabled)?;
            Ok(CommandOutput::Text(format!(
                "Do not disturb turned {}",
                label(enabled)
            )))
        },
        None => Ok(CommandOutput::Text(format!(
            "Do not disturb: {}",
            label(service.do_not_disturb()?)
        ))),
    }
}

//! App catalog commands: apps, search, open, appinfo.

use deskshell_platform::AppInfo;
use deskshell_types::error::{Result, ShellError};

use crate::binder::BoundArguments;
use crate::command::{CommandOutput, CommandSpec};
use crate::environment::{Capability, Environment};
use crate::param::ParameterSpec;

pub(crate) fn commands() -> Vec<CommandSpec> {
    vec![
        CommandSpec::builder("apps")
            .alias("ls-apps")
            .description("List installed apps")
            .category("apps")
            .requires(Capability::Packages)
            .parameter(ParameterSpec::string("filter").describe("Substring of label or package"))
            .parameter(
                ParameterSpec::boolean("system")
                    .named_only()
                    .default_value("false")
                    .describe("Include preinstalled system apps"),
            )
            .example("apps")
            .example("apps mail --system")
            .build(apps),
        CommandSpec::builder("search")
            .alias("find-app")
            .description("Search installed apps by name")
            .category("apps")
            .requires(Capability::Packages)
            .parameter(ParameterSpec::string("query").rest().required())
            .example("search weather")
            .build(search),
        CommandSpec::builder("open")
            .alias("launch")
            .description("Launch an installed app")
            .category("apps")
            .requires(Capability::Packages)
            .parameter(ParameterSpec::package("package").required())
            .example("open org.example.notes")
            .build(open),
        CommandSpec::builder("appinfo")
            .description("Show details of an installed app")
            .category("apps")
            .requires(Capability::Packages)
            .parameter(ParameterSpec::package("package").required())
            .build(appinfo),
    ]
}

fn matches(app: &AppInfo, needle: &str) -> bool {
    app.label.to_lowercase().contains(needle) || app.package.to_lowercase().contains(needle)
}

fn lookup(env: &Environment<'_>, package: &str) -> Result<AppInfo> {
    env.require_packages()?
        .app(package)?
        .ok_or_else(|| ShellError::Command(format!("package not installed: {package}")))
}

// ---------------------------------------------------------------------------
// apps
// ---------------------------------------------------------------------------

fn apps(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let include_system = args.get_bool("system").unwrap_or(false);
    let needle = args.get("filter").map(str::to_lowercase);

    let mut list: Vec<AppInfo> = env
        .require_packages()?
        .installed_apps()?
        .into_iter()
        .filter(|a| include_system || !a.system)
        .filter(|a| needle.as_deref().is_none_or(|n| matches(a, n)))
        .collect();
    if list.is_empty() {
        return Ok(CommandOutput::Text("No matching apps".to_string()));
    }
    list.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));

    Ok(CommandOutput::Table {
        headers: vec!["Label".into(), "Package".into()],
        rows: list
            .into_iter()
            .map(|a| {
                let label = if a.system {
                    format!("{} (system)", a.label)
                } else {
                    a.label
                };
                vec![label, a.package]
            })
            .collect(),
    })
}

// ---------------------------------------------------------------------------
// search
// ---------------------------------------------------------------------------

/// Label prefix matches rank ahead of other substring matches.
fn search(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let query = args.require("query")?;
    let needle = query.to_lowercase();

    let mut hits: Vec<(bool, AppInfo)> = env
        .require_packages()?
        .installed_apps()?
        .into_iter()
        .filter(|a| matches(a, &needle))
        .map(|a| (!a.label.to_lowercase().starts_with(&needle), a))
        .collect();
    if hits.is_empty() {
        return Ok(CommandOutput::Text(format!("No apps match '{query}'")));
    }
    hits.sort_by(|(ra, a), (rb, b)| ra.cmp(rb).then_with(|| a.label.cmp(&b.label)));

    let lines: Vec<String> = hits
        .iter()
        .map(|(_, a)| format!("{} ({})", a.label, a.package))
        .collect();
    Ok(CommandOutput::Text(lines.join("\n")))
}

// ---------------------------------------------------------------------------
// open
// ---------------------------------------------------------------------------

fn open(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let app = lookup(env, args.require("package")?)?;
    env.require_packages()?.launch(&app.package)?;
    Ok(CommandOutput::Text(format!("Launched {}", app.label)))
}

// ---------------------------------------------------------------------------
// appinfo
// ---------------------------------------------------------------------------

fn appinfo(env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
    let app = lookup(env, args.require("package")?)?;
    let lines = [
        format!("Label: {}", app.label),
        format!("Package: {}", app.package),
        format!("Version: {}", app.version.as_deref().unwrap_or("unknown")),
        format!("System app: {}", if app.system { "yes" } else { "no" }),
    ];
    Ok(CommandOutput::Text(lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{MockPlatform, run};

    #[test]
    fn apps_hides_system_by_default() {
        let platform = MockPlatform::new();
        assert_eq!(
            run(&platform, "apps").text,
            "Label | Package\n\
             Mail | org.example.mail\n\
             Notes | org.example.notes\n\
             Weather | org.example.weather"
        );
    }

    #[test]
    fn apps_with_system_flag() {
        let platform = MockPlatform::new();
        let text = run(&platform, "ls-apps --system").text;
        assert!(text.contains("Settings (system) | com.android.settings"));
        assert_eq!(text.lines().count(), 5);
    }

    #[test]
    fn apps_filter() {
        let platform = MockPlatform::new();
        assert_eq!(
            run(&platform, "apps NOTE").text,
            "Label | Package\nNotes | org.example.notes"
        );
        assert_eq!(run(&platform, "apps settings").text, "No matching apps");
        assert!(
            run(&platform, "apps settings --system=yes")
                .text
                .contains("com.android.settings")
        );
    }

    #[test]
    fn apps_system_flag_is_not_positional() {
        let platform = MockPlatform::new();
        // "true" lands in `filter`, not `system`.
        assert_eq!(run(&platform, "apps true").text, "No matching apps");
    }

    #[test]
    fn search_ranks_prefix_first() {
        let mut platform = MockPlatform::new();
        platform.apps.push(deskshell_platform::AppInfo {
            package: "org.example.sticky".into(),
            label: "Sticky Notes".into(),
            system: false,
            version: None,
        });
        assert_eq!(
            run(&platform, "search notes").text,
            "Notes (org.example.notes)\nSticky Notes (org.example.sticky)"
        );
    }

    #[test]
    fn search_multiword_query() {
        let platform = MockPlatform::new();
        assert_eq!(
            run(&platform, "find-app rain radar").text,
            "No apps match 'rain radar'"
        );
        assert!(!run(&platform, "search").succeeded);
    }

    #[test]
    fn search_matches_package() {
        let platform = MockPlatform::new();
        assert_eq!(
            run(&platform, "search android").text,
            "Settings (com.android.settings)"
        );
    }

    #[test]
    fn open_launches() {
        let platform = MockPlatform::new();
        let result = run(&platform, "launch org.example.mail");
        assert!(result.succeeded);
        assert_eq!(result.text, "Launched Mail");
        assert_eq!(*platform.launched.lock().unwrap(), ["org.example.mail"]);
    }

    #[test]
    fn open_unknown_package() {
        let platform = MockPlatform::new();
        let result = run(&platform, "open org.example.missing");
        assert!(!result.succeeded);
        assert!(result.text.contains("package not installed"));
        assert!(platform.launched.lock().unwrap().is_empty());
    }

    #[test]
    fn open_rejects_bad_package_name() {
        let platform = MockPlatform::new();
        let result = run(&platform, "open notes");
        assert!(!result.succeeded);
        assert!(result.text.contains("expects package name"));
    }

    #[test]
    fn appinfo_details() {
        let platform = MockPlatform::new();
        assert_eq!(
            run(&platform, "appinfo com.android.settings").text,
            "Label: Settings\nPackage: com.android.settings\nVersion: unknown\nSystem app: yes"
        );
    }
}

//! Argument binding: raw tokens + parameter specs -> resolved arguments.
//!
//! Binding is a pure function. Flags (`--name=value`, or bare `--name`
//! meaning `true`) always win over positional tokens; a parameter with no
//! flag falls back according to its [`PositionalPolicy`], then to its
//! default. Values are type-checked and normalised, so binding the output
//! of [`BoundArguments::to_tokens`] again yields the same map.

use std::collections::BTreeMap;

use deskshell_platform::{format_mac, parse_mac};
use deskshell_types::error::{Result, ShellError};
use serde::Serialize;

use crate::command::CommandSpec;
use crate::param::{ParameterKind, ParameterSpec, PositionalPolicy};

/// Per-invocation binding failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("missing required parameter '{0}'")]
    MissingRequired(String),

    #[error("invalid value '{value}' for '{parameter}' (expected one of: {expected})", expected = .options.join(", "))]
    InvalidEnumValue {
        parameter: String,
        value: String,
        options: Vec<String>,
    },

    #[error("'{parameter}' expects {expected}, got '{value}'")]
    TypeMismatch {
        parameter: String,
        expected: ParameterKind,
        value: String,
    },

    #[error("unknown flag '--{0}'")]
    UnknownFlag(String),

    #[error("flag '--{0}' needs a value (--{0}=<value>)")]
    MissingValue(String),
}

/// Fully resolved arguments for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoundArguments {
    by_name: BTreeMap<String, String>,
    positional: Vec<String>,
}

impl BoundArguments {
    /// Resolved value of a parameter, if it has one.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Resolved value of a parameter the spec marks as required (or defaulted).
    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| ShellError::Command(format!("missing argument '{name}'")))
    }

    /// Boolean parameters are stored normalised as `true` / `false`.
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| v == "true")
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    pub fn by_name(&self) -> &BTreeMap<String, String> {
        &self.by_name
    }

    /// The positional tokens exactly as they were given.
    pub fn positional(&self) -> &[String] {
        &self.positional
    }

    /// Re-serialise the resolved map as `--name=value` tokens.
    pub fn to_tokens(&self) -> Vec<String> {
        self.by_name
            .iter()
            .map(|(name, value)| format!("--{name}={value}"))
            .collect()
    }
}

/// Bind raw tokens (without the command name) against a command's parameters.
pub fn bind<S: AsRef<str>>(
    spec: &CommandSpec,
    raw_tokens: &[S],
) -> std::result::Result<BoundArguments, BindError> {
    let (flags, positional) = partition(raw_tokens);

    if let Some((name, _)) = flags.iter().find(|(name, _)| spec.parameter(name).is_none()) {
        return Err(BindError::UnknownFlag(name.clone()));
    }
    // Only boolean parameters may be given as a bare `--name`.
    if let Some((name, _)) = flags.iter().find(|(name, value)| {
        value.is_none()
            && spec
                .parameter(name)
                .is_some_and(|p| p.kind() != ParameterKind::Boolean)
    }) {
        return Err(BindError::MissingValue(name.clone()));
    }

    let mut by_name = BTreeMap::new();
    let mut next = 0;
    for param in spec.parameters() {
        // Last occurrence of a repeated flag wins.
        let flagged = flags
            .iter()
            .rev()
            .find(|(name, _)| name == param.name())
            .map(|(_, value)| value.clone().unwrap_or_else(|| "true".to_string()));

        let raw = flagged
            .or_else(|| match param.policy() {
                PositionalPolicy::Positional => {
                    let token = positional.get(next).cloned();
                    if token.is_some() {
                        next += 1;
                    }
                    token
                },
                PositionalPolicy::Rest if next < positional.len() => {
                    let joined = positional[next..].join(" ");
                    next = positional.len();
                    Some(joined)
                },
                PositionalPolicy::Rest | PositionalPolicy::NamedOnly => None,
            })
            .or_else(|| param.default().map(str::to_string));

        match raw {
            Some(value) => {
                let value = coerce(param, &value)?;
                by_name.insert(param.name().to_string(), value);
            },
            None if param.is_required() => {
                return Err(BindError::MissingRequired(param.name().to_string()));
            },
            None => {},
        }
    }

    Ok(BoundArguments {
        by_name,
        positional,
    })
}

/// Split tokens into `(name, value)` flags and positionals, preserving order.
///
/// A bare `--name` has no value. A bare `--` ends flag parsing; every later
/// token is positional.
fn partition<S: AsRef<str>>(raw_tokens: &[S]) -> (Vec<(String, Option<String>)>, Vec<String>) {
    let mut flags = Vec::new();
    let mut positional = Vec::new();
    let mut flags_done = false;

    for token in raw_tokens {
        let token = token.as_ref();
        if flags_done {
            positional.push(token.to_string());
            continue;
        }
        if token == "--" {
            flags_done = true;
            continue;
        }
        match token.strip_prefix("--") {
            Some(body) if !body.is_empty() && !body.starts_with('=') => {
                match body.split_once('=') {
                    Some((name, value)) => flags.push((name.to_string(), Some(value.to_string()))),
                    None => flags.push((body.to_string(), None)),
                }
            },
            _ => positional.push(token.to_string()),
        }
    }
    (flags, positional)
}

/// Type-check a raw value and return its normalised form.
pub(crate) fn coerce(
    param: &ParameterSpec,
    value: &str,
) -> std::result::Result<String, BindError> {
    let mismatch = || BindError::TypeMismatch {
        parameter: param.name().to_string(),
        expected: param.kind(),
        value: value.to_string(),
    };

    match param.kind() {
        ParameterKind::String => Ok(value.to_string()),
        ParameterKind::Boolean => match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok("true".to_string()),
            "false" | "no" | "off" | "0" => Ok("false".to_string()),
            _ => Err(mismatch()),
        },
        ParameterKind::Integer => value
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|_| mismatch()),
        ParameterKind::Enum => {
            if param.options().iter().any(|o| o == value) {
                Ok(value.to_string())
            } else {
                Err(BindError::InvalidEnumValue {
                    parameter: param.name().to_string(),
                    value: value.to_string(),
                    options: param.options().to_vec(),
                })
            }
        },
        ParameterKind::Path => {
            if value.is_empty() || value.contains('\0') {
                Err(mismatch())
            } else {
                Ok(value.to_string())
            }
        },
        ParameterKind::PackageName => {
            if is_package_name(value) {
                Ok(value.to_string())
            } else {
                Err(mismatch())
            }
        },
        ParameterKind::MacAddress => parse_mac(value)
            .map(|mac| format_mac(&mac))
            .ok_or_else(mismatch),
    }
}

/// Two or more dot-separated identifiers, each starting with a letter.
fn is_package_name(value: &str) -> bool {
    let mut segments = 0;
    for segment in value.split('.') {
        let mut chars = segment.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use crate::environment::Environment;

    fn noop(_env: &Environment<'_>, _args: &BoundArguments) -> Result<CommandOutput> {
        Ok(CommandOutput::None)
    }

    fn ping_spec() -> CommandSpec {
        CommandSpec::builder("ping")
            .parameter(ParameterSpec::string("host").required())
            .parameter(ParameterSpec::integer("count").default_value("4"))
            .build(noop)
    }

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ---- Scenarios ----

    #[test]
    fn positional_host_with_default_count() {
        let args = bind(&ping_spec(), &["8.8.8.8"]).unwrap();
        assert_eq!(args.by_name(), &map(&[("host", "8.8.8.8"), ("count", "4")]));
    }

    #[test]
    fn flag_before_positional() {
        let args = bind(&ping_spec(), &["--count=10", "google.com"]).unwrap();
        assert_eq!(
            args.by_name(),
            &map(&[("host", "google.com"), ("count", "10")])
        );
    }

    #[test]
    fn missing_required_host() {
        let empty: [&str; 0] = [];
        let err = bind(&ping_spec(), &empty).unwrap_err();
        assert_eq!(err, BindError::MissingRequired("host".to_string()));
    }

    // ---- Flags ----

    #[test]
    fn named_flag_beats_positional() {
        let spec = CommandSpec::builder("open")
            .parameter(ParameterSpec::string("host").required())
            .parameter(ParameterSpec::integer("port").named_only())
            .build(noop);
        let args = bind(&spec, &["example.org", "--host=example.com"]).unwrap();
        assert_eq!(args.get("host"), Some("example.com"));
        // The unused positional stays visible to handlers.
        assert_eq!(args.positional(), ["example.org".to_string()]);
    }

    #[test]
    fn leftover_positional_flows_to_next_parameter() {
        let err = bind(&ping_spec(), &["example.org", "--host=example.com"]).unwrap_err();
        assert_eq!(
            err,
            BindError::TypeMismatch {
                parameter: "count".into(),
                expected: ParameterKind::Integer,
                value: "example.org".into(),
            }
        );
    }

    #[test]
    fn repeated_flag_last_wins() {
        let args = bind(&ping_spec(), &["h", "--count=1", "--count=7"]).unwrap();
        assert_eq!(args.get_int("count"), Some(7));
    }

    #[test]
    fn bare_flag_means_true() {
        let spec = CommandSpec::builder("apps")
            .parameter(ParameterSpec::boolean("system").named_only().default_value("false"))
            .build(noop);
        let args = bind(&spec, &["--system"]).unwrap();
        assert_eq!(args.get_bool("system"), Some(true));
        let args = bind(&spec, &[] as &[&str]).unwrap();
        assert_eq!(args.get_bool("system"), Some(false));
    }

    #[test]
    fn bare_flag_needs_value_unless_boolean() {
        let err = bind(&ping_spec(), &["--host"]).unwrap_err();
        assert_eq!(err, BindError::MissingValue("host".to_string()));
        assert_eq!(err.to_string(), "flag '--host' needs a value (--host=<value>)");
        assert_eq!(
            bind(&ping_spec(), &["example.com", "--count"]),
            Err(BindError::MissingValue("count".to_string()))
        );
        // An explicitly empty value is still a value and gets type-checked.
        assert_eq!(
            bind(&ping_spec(), &["--host="]).unwrap().get("host"),
            Some("")
        );
    }

    #[test]
    fn flag_value_may_contain_equals() {
        let spec = CommandSpec::builder("echo")
            .parameter(ParameterSpec::string("text"))
            .build(noop);
        let args = bind(&spec, &["--text=a=b"]).unwrap();
        assert_eq!(args.get("text"), Some("a=b"));
    }

    #[test]
    fn unknown_flag_rejected() {
        let err = bind(&ping_spec(), &["host", "--verbose"]).unwrap_err();
        assert_eq!(err, BindError::UnknownFlag("verbose".to_string()));
    }

    #[test]
    fn double_dash_ends_flags() {
        let spec = CommandSpec::builder("echo")
            .parameter(ParameterSpec::string("text").rest())
            .build(noop);
        let args = bind(&spec, &["--", "--not-a-flag", "x"]).unwrap();
        assert_eq!(args.get("text"), Some("--not-a-flag x"));
    }

    #[test]
    fn single_dash_tokens_are_positional() {
        let spec = CommandSpec::builder("calc")
            .parameter(ParameterSpec::integer("n"))
            .build(noop);
        let args = bind(&spec, &["-5"]).unwrap();
        assert_eq!(args.get_int("n"), Some(-5));
    }

    // ---- Positional policies ----

    #[test]
    fn rest_parameter_joins_remaining_tokens() {
        let spec = CommandSpec::builder("search")
            .parameter(ParameterSpec::string("query").rest().required())
            .build(noop);
        let args = bind(&spec, &["weather", "in", "Oslo"]).unwrap();
        assert_eq!(args.get("query"), Some("weather in Oslo"));
    }

    #[test]
    fn rest_after_positional() {
        let spec = CommandSpec::builder("note")
            .parameter(ParameterSpec::string("title").required())
            .parameter(ParameterSpec::string("body").rest())
            .build(noop);
        let args = bind(&spec, &["groceries", "milk", "eggs"]).unwrap();
        assert_eq!(args.get("title"), Some("groceries"));
        assert_eq!(args.get("body"), Some("milk eggs"));
    }

    #[test]
    fn named_only_ignores_positionals() {
        let spec = CommandSpec::builder("notifications")
            .parameter(ParameterSpec::package("app").named_only())
            .build(noop);
        let args = bind(&spec, &["org.example.mail"]).unwrap();
        assert_eq!(args.get("app"), None);
        assert_eq!(args.positional().len(), 1);
    }

    #[test]
    fn optional_without_default_is_absent() {
        let spec = CommandSpec::builder("apps")
            .parameter(ParameterSpec::string("filter"))
            .build(noop);
        let args = bind(&spec, &[] as &[&str]).unwrap();
        assert!(args.by_name().is_empty());
        assert!(args.require("filter").is_err());
    }

    // ---- Type checks ----

    #[test]
    fn enum_value_outside_options() {
        let spec = CommandSpec::builder("wifi")
            .parameter(ParameterSpec::enumeration("action", &["status", "on", "off"]))
            .build(noop);
        let err = bind(&spec, &["reboot"]).unwrap_err();
        assert_eq!(
            err,
            BindError::InvalidEnumValue {
                parameter: "action".into(),
                value: "reboot".into(),
                options: vec!["status".into(), "on".into(), "off".into()],
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid value 'reboot' for 'action' (expected one of: status, on, off)"
        );
    }

    #[test]
    fn integer_type_mismatch() {
        let err = bind(&ping_spec(), &["host", "--count=lots"]).unwrap_err();
        assert_eq!(
            err,
            BindError::TypeMismatch {
                parameter: "count".into(),
                expected: ParameterKind::Integer,
                value: "lots".into(),
            }
        );
        assert_eq!(err.to_string(), "'count' expects integer, got 'lots'");
    }

    #[test]
    fn integer_is_normalised() {
        let args = bind(&ping_spec(), &["host", "+007"]).unwrap();
        assert_eq!(args.get("count"), Some("7"));
    }

    #[test]
    fn boolean_spellings() {
        let spec = CommandSpec::builder("dnd")
            .parameter(ParameterSpec::boolean("enabled"))
            .build(noop);
        for (input, expected) in [("on", true), ("YES", true), ("0", false), ("Off", false)] {
            let args = bind(&spec, &[input]).unwrap();
            assert_eq!(args.get_bool("enabled"), Some(expected), "input {input}");
        }
        assert!(matches!(
            bind(&spec, &["maybe"]),
            Err(BindError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn mac_address_normalised() {
        let spec = CommandSpec::builder("bt-connect")
            .parameter(ParameterSpec::mac_address("address").required())
            .build(noop);
        let args = bind(&spec, &["aa-bb-cc-dd-ee-0f"]).unwrap();
        assert_eq!(args.get("address"), Some("AA:BB:CC:DD:EE:0F"));
        assert!(bind(&spec, &["aa:bb"]).is_err());
        assert!(matches!(
            bind(&spec, &["+A:BB:CC:DD:EE:FF"]),
            Err(BindError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn package_names() {
        assert!(is_package_name("org.example.notes"));
        assert!(is_package_name("com.android.settings_2"));
        assert!(!is_package_name("notes"));
        assert!(!is_package_name("org..notes"));
        assert!(!is_package_name("org.9lives"));
        assert!(!is_package_name("org.example."));
        assert!(!is_package_name("org.exa mple"));
    }

    #[test]
    fn path_rejects_empty() {
        let spec = CommandSpec::builder("cat")
            .parameter(ParameterSpec::path("file").required())
            .build(noop);
        assert!(bind(&spec, &["--file="]).is_err());
        assert_eq!(bind(&spec, &["/sdcard/a.txt"]).unwrap().get("file"), Some("/sdcard/a.txt"));
    }

    #[test]
    fn default_is_type_checked_too() {
        let spec = CommandSpec::builder("broken")
            .parameter(ParameterSpec::integer("n").default_value("many"))
            .build(noop);
        assert!(matches!(
            bind(&spec, &[] as &[&str]),
            Err(BindError::TypeMismatch { .. })
        ));
    }

    // ---- Round trip ----

    #[test]
    fn to_tokens_rebinds_to_same_map() {
        let spec = ping_spec();
        let first = bind(&spec, &["example.com", "3"]).unwrap();
        let tokens = first.to_tokens();
        assert_eq!(tokens, ["--count=3", "--host=example.com"]);
        let second = bind(&spec, &tokens).unwrap();
        assert_eq!(first.by_name(), second.by_name());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn mixed_spec() -> CommandSpec {
            CommandSpec::builder("mixed")
                .parameter(ParameterSpec::string("target").required())
                .parameter(ParameterSpec::integer("count").default_value("4"))
                .parameter(ParameterSpec::enumeration("mode", &["fast", "slow"]).named_only())
                .parameter(ParameterSpec::boolean("quiet").named_only())
                .parameter(ParameterSpec::string("note").rest())
                .build(noop)
        }

        fn token() -> impl Strategy<Value = String> {
            prop_oneof![
                "[a-z0-9.]{1,8}",
                "-?[0-9]{1,4}",
                "--count=[0-9a-z]{0,3}",
                "--mode=(fast|slow|other)",
                "--quiet(=(yes|no|true|off))?",
                "--target=[a-z]{1,6}",
            ]
        }

        proptest! {
            #[test]
            fn binding_is_idempotent(tokens in proptest::collection::vec(token(), 0..8)) {
                let spec = mixed_spec();
                if let Ok(first) = bind(&spec, &tokens) {
                    let second = bind(&spec, &first.to_tokens());
                    prop_assert_eq!(Ok(first.by_name().clone()), second.map(|b| b.by_name().clone()));
                }
            }

            #[test]
            fn missing_required_is_never_partial(
                flags in proptest::collection::vec("--count=[0-9]{1,3}", 0..4)
            ) {
                // Only flags for `count`; `target` never resolves.
                let result = bind(&mixed_spec(), &flags);
                prop_assert_eq!(result, Err(BindError::MissingRequired("target".to_string())));
            }

            #[test]
            fn bad_enum_rejected_at_any_position(
                before in proptest::collection::vec("[0-9]{1,4}", 1..4),
                after in proptest::collection::vec("[0-9]{1,4}", 0..4),
                bad in "[a-z]{1,6}",
            ) {
                prop_assume!(bad != "fast" && bad != "slow");
                let mut tokens = before.clone();
                tokens.push(format!("--mode={bad}"));
                tokens.extend(after);
                let result = bind(&mixed_spec(), &tokens);
                let is_enum_error = matches!(result, Err(BindError::InvalidEnumValue { .. }));
                prop_assert!(is_enum_error);
            }
        }
    }
}

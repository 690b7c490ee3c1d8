//! Declarative parameter descriptions.

use std::fmt;

/// Value type of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Boolean,
    Integer,
    /// One of a fixed set of options.
    Enum,
    Path,
    /// Reverse-DNS package name such as `org.example.notes`.
    PackageName,
    /// `AA:BB:CC:DD:EE:FF` hardware address.
    MacAddress,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Enum => write!(f, "enum"),
            Self::Path => write!(f, "path"),
            Self::PackageName => write!(f, "package name"),
            Self::MacAddress => write!(f, "MAC address"),
        }
    }
}

/// How a parameter picks up a value when no `--name` flag supplies one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionalPolicy {
    /// Take the next unused positional token.
    #[default]
    Positional,
    /// Take every remaining positional token, joined by single spaces.
    Rest,
    /// Only a `--name` flag can supply the value.
    NamedOnly,
}

/// Description of one named command argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSpec {
    name: String,
    kind: ParameterKind,
    required: bool,
    default: Option<String>,
    options: Vec<String>,
    description: String,
    policy: PositionalPolicy,
}

impl ParameterSpec {
    pub fn new(name: &str, kind: ParameterKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            default: None,
            options: Vec::new(),
            description: String::new(),
            policy: PositionalPolicy::default(),
        }
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, ParameterKind::String)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ParameterKind::Boolean)
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ParameterKind::Integer)
    }

    pub fn path(name: &str) -> Self {
        Self::new(name, ParameterKind::Path)
    }

    pub fn package(name: &str) -> Self {
        Self::new(name, ParameterKind::PackageName)
    }

    pub fn mac_address(name: &str) -> Self {
        Self::new(name, ParameterKind::MacAddress)
    }

    /// An enum parameter accepting exactly `options` (duplicates dropped).
    pub fn enumeration(name: &str, options: &[&str]) -> Self {
        let mut spec = Self::new(name, ParameterKind::Enum);
        for opt in options {
            if !spec.options.iter().any(|o| o == opt) {
                spec.options.push((*opt).to_string());
            }
        }
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    /// Absorb all remaining positional tokens (free-form text).
    pub fn rest(mut self) -> Self {
        self.policy = PositionalPolicy::Rest;
        self
    }

    /// Accept this parameter only as `--name[=value]`.
    pub fn named_only(mut self) -> Self {
        self.policy = PositionalPolicy::NamedOnly;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn policy(&self) -> PositionalPolicy {
        self.policy
    }

    /// Usage fragment, e.g. `<host>`, `[--count=<integer>]`, `[query...]`.
    pub fn usage_fragment(&self) -> String {
        let placeholder = match self.kind {
            ParameterKind::Enum => self.options.join("|"),
            _ => self.name.clone(),
        };
        let body = match self.policy {
            PositionalPolicy::Positional => placeholder,
            PositionalPolicy::Rest => format!("{placeholder}..."),
            PositionalPolicy::NamedOnly if self.kind == ParameterKind::Boolean => {
                format!("--{}", self.name)
            },
            PositionalPolicy::NamedOnly => format!("--{}=<{}>", self.name, self.kind),
        };
        if self.required {
            format!("<{body}>")
        } else {
            format!("[{body}]")
        }
    }

    /// One-line summary of type, requiredness and default for `help`.
    pub fn summary(&self) -> String {
        let mut out = match self.kind {
            ParameterKind::Enum => format!("one of {}", self.options.join("/")),
            kind => kind.to_string(),
        };
        if self.required {
            out.push_str(", required");
        }
        if let Some(default) = &self.default {
            out.push_str(&format!(", default {default}"));
        }
        out
    }
}

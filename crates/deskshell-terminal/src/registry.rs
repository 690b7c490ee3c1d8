//! Command registry and dispatch.
//!
//! The registry is filled once at startup and then sealed. After sealing it
//! is read-only, so any number of threads may dispatch through a shared
//! reference. Every failure past this point becomes a failed
//! [`InvocationResult`]; nothing is thrown back to the caller.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Instant;

use deskshell_types::error::{Result, ShellError};

use crate::binder::{bind, coerce};
use crate::command::{CommandSpec, InvocationResult, elapsed_millis};
use crate::environment::Environment;
use crate::param::{ParameterKind, PositionalPolicy};

/// Names handled by the registry itself.
const BUILTINS: [&str; 2] = ["help", "which"];

/// Startup-time registration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("command name must be a single non-empty word: '{0}'")]
    InvalidName(String),

    #[error("duplicate command name or alias '{0}'")]
    DuplicateName(String),

    #[error("{command}: enum parameter '{parameter}' has no options")]
    EmptyEnumOptions { command: String, parameter: String },

    #[error("{command}: invalid default for '{parameter}': {reason}")]
    InvalidDefault {
        command: String,
        parameter: String,
        reason: String,
    },

    #[error("{command}: parameter '{parameter}' declared twice")]
    DuplicateParameter { command: String, parameter: String },

    #[error("{command}: invalid parameter name '{parameter}'")]
    InvalidParameterName { command: String, parameter: String },

    #[error("{command}: parameter '{parameter}' can never receive a positional value")]
    UnreachableParameter { command: String, parameter: String },

    #[error("registry is sealed; cannot register '{0}'")]
    Sealed(String),
}

/// Lifecycle of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// Accepting registrations; dispatch is refused.
    Uninitialized,
    /// Sealed and read-only; dispatch is allowed.
    Ready,
}

/// Name/alias-keyed table of commands.
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
    /// Name or alias -> index into `commands`.
    index: HashMap<String, usize>,
    state: RegistryState,
}

impl CommandRegistry {
    /// Create an empty registry in the `Uninitialized` state.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
            state: RegistryState::Uninitialized,
        }
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == RegistryState::Ready
    }

    /// Number of registered commands (aliases not counted).
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Registered specs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter()
    }

    /// Add a command. On error the registry is left untouched.
    pub fn register(&mut self, spec: CommandSpec) -> std::result::Result<(), ConfigurationError> {
        if self.state == RegistryState::Ready {
            return Err(ConfigurationError::Sealed(spec.name().to_string()));
        }
        self.validate(&spec)?;

        let idx = self.commands.len();
        for name in spec.names() {
            self.index.insert(name.to_string(), idx);
        }
        log::debug!(
            "Registered command '{}' ({} aliases)",
            spec.name(),
            spec.aliases().len()
        );
        self.commands.push(spec);
        Ok(())
    }

    /// Move to `Ready`. Further registrations fail.
    pub fn seal(&mut self) {
        if self.state == RegistryState::Uninitialized {
            self.state = RegistryState::Ready;
            log::debug!("Command registry ready ({} commands)", self.commands.len());
        }
    }

    fn validate(&self, spec: &CommandSpec) -> std::result::Result<(), ConfigurationError> {
        let command = spec.name().to_string();
        let mut seen = HashSet::new();
        for name in spec.names() {
            if name.is_empty() || name.chars().any(char::is_whitespace) || name.starts_with('-') {
                return Err(ConfigurationError::InvalidName(name.to_string()));
            }
            if BUILTINS.contains(&name) || self.index.contains_key(name) || !seen.insert(name) {
                return Err(ConfigurationError::DuplicateName(name.to_string()));
            }
        }

        let mut params = HashSet::new();
        let mut after_rest = false;
        for param in spec.parameters() {
            let parameter = param.name().to_string();
            if parameter.is_empty()
                || parameter.contains('=')
                || parameter.starts_with('-')
                || parameter.chars().any(char::is_whitespace)
            {
                return Err(ConfigurationError::InvalidParameterName { command, parameter });
            }
            if !params.insert(param.name()) {
                return Err(ConfigurationError::DuplicateParameter { command, parameter });
            }
            match param.policy() {
                PositionalPolicy::Rest | PositionalPolicy::Positional if after_rest => {
                    return Err(ConfigurationError::UnreachableParameter { command, parameter });
                },
                PositionalPolicy::Rest => after_rest = true,
                _ => {},
            }
            if param.kind() == ParameterKind::Enum && param.options().is_empty() {
                return Err(ConfigurationError::EmptyEnumOptions { command, parameter });
            }
            if let Some(default) = param.default()
                && let Err(e) = coerce(param, default)
            {
                return Err(ConfigurationError::InvalidDefault {
                    command,
                    parameter,
                    reason: e.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Exact, case-sensitive lookup by name or alias.
    pub fn resolve(&self, token: &str) -> Option<&CommandSpec> {
        self.index.get(token).map(|&idx| &self.commands[idx])
    }

    /// Resolve the head token, bind the rest, and run the handler.
    pub fn dispatch<S: AsRef<str>>(
        &self,
        env: &Environment<'_>,
        raw_tokens: &[S],
    ) -> InvocationResult {
        let start = Instant::now();
        if self.state != RegistryState::Ready {
            return not_ready(start);
        }
        let Some((head, rest)) = raw_tokens.split_first() else {
            return InvocationResult::success("", elapsed_millis(start));
        };
        let head = head.as_ref();

        // Intercept built-in commands that need registry access.
        let builtin = match head {
            "help" => Some(self.execute_help(rest)),
            "which" => Some(self.execute_which(rest)),
            _ => None,
        };
        if let Some(outcome) = builtin {
            return match outcome {
                Ok(text) => InvocationResult::success(text, elapsed_millis(start)),
                Err(e) => InvocationResult::failure(format!("{head}: {e}"), elapsed_millis(start)),
            };
        }

        let Some(spec) = self.resolve(head) else {
            log::debug!("Unresolved command: {head}");
            return InvocationResult::failure(
                format!("{head}: command not found"),
                elapsed_millis(start),
            );
        };

        if let Some(missing) = spec
            .required_capabilities()
            .iter()
            .find(|cap| !env.has(**cap))
        {
            return InvocationResult::failure(
                format!("{}: requires the {missing} service, which is not available", spec.name()),
                elapsed_millis(start),
            );
        }

        let args = match bind(spec, rest) {
            Ok(args) => args,
            Err(e) => {
                log::debug!("Bind failed for '{}': {e}", spec.name());
                return InvocationResult::failure(
                    format!("{}: {e}\nusage: {}", spec.name(), spec.usage()),
                    elapsed_millis(start),
                );
            },
        };

        let mut result = spec.invoke(env, &args);
        result.elapsed_millis = elapsed_millis(start);
        result
    }

    /// Tokenize a raw input line and dispatch it.
    pub fn execute_line(&self, env: &Environment<'_>, line: &str) -> InvocationResult {
        let start = Instant::now();
        if self.state != RegistryState::Ready {
            return not_ready(start);
        }
        match tokenize(line) {
            Ok(tokens) => {
                let mut result = self.dispatch(env, &tokens);
                result.elapsed_millis = elapsed_millis(start);
                result
            },
            Err(e) => InvocationResult::failure(e.to_string(), elapsed_millis(start)),
        }
    }

    // -- Intercepted commands --

    /// Built-in help with access to the registry.
    fn execute_help<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        if let Some(name) = args.first() {
            let name = name.as_ref();
            if BUILTINS.contains(&name) {
                return Ok(format!("{name}: shell built-in"));
            }
            let spec = self
                .resolve(name)
                .ok_or_else(|| ShellError::Command(format!("unknown command: {name}")))?;
            return Ok(describe(spec));
        }

        // Group commands by category.
        let mut categories: BTreeMap<&str, Vec<(&str, &str)>> = BTreeMap::new();
        for builtin in BUILTINS {
            categories.entry("general").or_default().push((builtin, ""));
        }
        for spec in &self.commands {
            categories
                .entry(spec.category())
                .or_default()
                .push((spec.name(), spec.description()));
        }

        let total: usize = categories.values().map(Vec::len).sum();
        let mut out = format!("Commands ({total}):\n");
        for (cat, cmds) in &mut categories {
            cmds.sort_by_key(|(name, _)| *name);
            out.push_str(&format!("\n  [{cat}]\n"));
            for (name, desc) in cmds.iter() {
                if desc.is_empty() {
                    out.push_str(&format!("    {name}\n"));
                } else {
                    out.push_str(&format!("    {name:14} {desc}\n"));
                }
            }
        }
        out.push_str("\nType 'help <command>' for details.");
        Ok(out)
    }

    /// Built-in `which` command.
    fn execute_which<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        let Some(name) = args.first() else {
            return Err(ShellError::Command("usage: which <command>".to_string()));
        };
        let name = name.as_ref();
        if BUILTINS.contains(&name) {
            return Ok(format!("{name}: shell built-in"));
        }
        match self.resolve(name) {
            Some(spec) if spec.name() == name => Ok(format!(
                "{}: {} ({})",
                spec.name(),
                spec.description(),
                spec.category()
            )),
            Some(spec) => Ok(format!("{name}: alias for {}", spec.name())),
            None => Err(ShellError::Command(format!("{name}: not found"))),
        }
    }

    /// Return a sorted list of (name, description) pairs.
    pub fn list_commands(&self) -> Vec<(&str, &str)> {
        let mut cmds: Vec<(&str, &str)> = self
            .commands
            .iter()
            .map(|c| (c.name(), c.description()))
            .collect();
        cmds.sort_by_key(|(name, _)| *name);
        cmds
    }

    /// Return completions (names, aliases, built-ins) for a partial command name.
    pub fn completions(&self, partial: &str) -> Vec<String> {
        let mut out: Vec<String> = BUILTINS
            .iter()
            .copied()
            .chain(self.index.keys().map(String::as_str))
            .filter(|name| name.starts_with(partial))
            .map(str::to_string)
            .collect();
        out.sort();
        out
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn not_ready(start: Instant) -> InvocationResult {
    InvocationResult::failure("command registry is not ready", elapsed_millis(start))
}

/// Detailed `help <command>` text.
fn describe(spec: &CommandSpec) -> String {
    let mut out = format!("{} ({})\n", spec.name(), spec.category());
    if !spec.description().is_empty() {
        out.push_str(&format!("  {}\n", spec.description()));
    }
    out.push_str(&format!("  Usage: {}", spec.usage()));
    if !spec.aliases().is_empty() {
        out.push_str(&format!("\n  Aliases: {}", spec.aliases().join(", ")));
    }
    if !spec.parameters().is_empty() {
        out.push_str("\n  Parameters:");
        for param in spec.parameters() {
            out.push_str(&format!("\n    --{:12} {}", param.name(), param.summary()));
            if !param.description().is_empty() {
                out.push_str(&format!(". {}", param.description()));
            }
        }
    }
    if !spec.required_capabilities().is_empty() {
        let caps: Vec<String> = spec
            .required_capabilities()
            .iter()
            .map(ToString::to_string)
            .collect();
        out.push_str(&format!("\n  Requires: {}", caps.join(", ")));
    }
    if !spec.examples().is_empty() {
        out.push_str("\n  Examples:");
        for example in spec.examples() {
            out.push_str(&format!("\n    {example}"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tokenizer: handles single quotes, double quotes, and backslash escapes.
// ---------------------------------------------------------------------------

/// Tokenize a command line respecting quotes and backslash escapes.
///
/// - Single-quoted strings preserve all characters literally.
/// - Double-quoted strings honour `\"` and `\\`.
/// - Backslash escapes the next character outside of quotes.
/// - Quotes may produce an empty token (`''`).
pub fn tokenize(input: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut chars = input.chars().peekable();
    let mut in_single = false;
    let mut in_double = false;

    while let Some(ch) = chars.next() {
        if in_single {
            if ch == '\'' {
                in_single = false;
            } else {
                current.push(ch);
            }
        } else if in_double {
            if ch == '"' {
                in_double = false;
            } else if ch == '\\' {
                match chars.peek() {
                    Some(&next) if next == '"' || next == '\\' => {
                        current.push(next);
                        chars.next();
                    },
                    _ => current.push('\\'),
                }
            } else {
                current.push(ch);
            }
        } else {
            match ch {
                '\'' => {
                    in_single = true;
                    has_token = true;
                },
                '"' => {
                    in_double = true;
                    has_token = true;
                },
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                        has_token = true;
                    }
                },
                c if c.is_whitespace() => {
                    if has_token || !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                        has_token = false;
                    }
                },
                _ => current.push(ch),
            }
        }
    }

    if in_single {
        return Err(ShellError::Command("unterminated single quote".to_string()));
    }
    if in_double {
        return Err(ShellError::Command("unterminated double quote".to_string()));
    }

    if has_token || !current.is_empty() {
        tokens.push(current);
    }

    Ok(tokens)
}

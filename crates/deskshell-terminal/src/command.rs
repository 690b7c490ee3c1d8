//! Command specs, handlers, and the invocation boundary.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use deskshell_types::error::Result;
use serde::Serialize;

use crate::binder::BoundArguments;
use crate::environment::{Capability, Environment};
use crate::param::ParameterSpec;

/// Output produced by a command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Plain text lines.
    Text(String),
    /// Tabular data (header row + data rows).
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    /// Command produced no visible output.
    None,
}

impl CommandOutput {
    /// Flatten to the text block shown to the user.
    pub fn render(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Table { headers, rows } => {
                let mut out = headers.join(" | ");
                for row in &rows {
                    out.push('\n');
                    out.push_str(&row.join(" | "));
                }
                out
            },
            Self::None => String::new(),
        }
    }
}

/// Outcome of a single command invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationResult {
    pub succeeded: bool,
    pub text: String,
    pub elapsed_millis: u64,
}

impl InvocationResult {
    pub fn success(text: impl Into<String>, elapsed_millis: u64) -> Self {
        Self {
            succeeded: true,
            text: text.into(),
            elapsed_millis,
        }
    }

    pub fn failure(text: impl Into<String>, elapsed_millis: u64) -> Self {
        Self {
            succeeded: false,
            text: text.into(),
            elapsed_millis,
        }
    }

    /// Serialize as a single-line JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The behavior behind a command.
///
/// Implemented for any `Fn(&Environment, &BoundArguments) -> Result<CommandOutput>`,
/// so plain functions serve as handlers.
pub trait CommandHandler: Send + Sync {
    fn execute(&self, env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput>;
}

impl<F> CommandHandler for F
where
    F: Fn(&Environment<'_>, &BoundArguments) -> Result<CommandOutput> + Send + Sync,
{
    fn execute(&self, env: &Environment<'_>, args: &BoundArguments) -> Result<CommandOutput> {
        self(env, args)
    }
}

/// Description of one invocable command.
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    description: String,
    usage: String,
    examples: Vec<String>,
    category: String,
    parameters: Vec<ParameterSpec>,
    capabilities: BTreeSet<Capability>,
    handler: Box<dyn CommandHandler>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("parameters", &self.parameters)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    pub fn builder(name: &str) -> CommandSpecBuilder {
        CommandSpecBuilder {
            name: name.to_string(),
            aliases: Vec::new(),
            description: String::new(),
            usage: None,
            examples: Vec::new(),
            category: "general".to_string(),
            parameters: Vec::new(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn required_capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    /// The primary name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Run the handler, converting every failure into a failed result.
    ///
    /// Errors returned by the handler and panics raised inside it both end
    /// up as `succeeded = false` with a readable message.
    pub fn invoke(&self, env: &Environment<'_>, args: &BoundArguments) -> InvocationResult {
        let start = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handler.execute(env, args)));
        let elapsed = elapsed_millis(start);
        match outcome {
            Ok(Ok(output)) => InvocationResult::success(output.render(), elapsed),
            Ok(Err(e)) => {
                log::warn!("command '{}' failed: {e}", self.name);
                InvocationResult::failure(format!("{}: {e}", self.name), elapsed)
            },
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                log::warn!("command '{}' panicked: {msg}", self.name);
                InvocationResult::failure(format!("{}: internal error: {msg}", self.name), elapsed)
            },
        }
    }
}

pub(crate) fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Builder for [`CommandSpec`].
pub struct CommandSpecBuilder {
    name: String,
    aliases: Vec<String>,
    description: String,
    usage: Option<String>,
    examples: Vec<String>,
    category: String,
    parameters: Vec<ParameterSpec>,
    capabilities: BTreeSet<Capability>,
}

impl CommandSpecBuilder {
    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }

    /// Override the usage line generated from the parameters.
    pub fn usage(mut self, text: &str) -> Self {
        self.usage = Some(text.to_string());
        self
    }

    pub fn example(mut self, text: &str) -> Self {
        self.examples.push(text.to_string());
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn parameter(mut self, param: ParameterSpec) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn requires(mut self, capability: Capability) -> Self {
        self.capabilities.insert(capability);
        self
    }

    /// Attach the handler and finish the spec.
    pub fn build(self, handler: impl CommandHandler + 'static) -> CommandSpec {
        let usage = self.usage.unwrap_or_else(|| {
            let mut parts = vec![self.name.clone()];
            parts.extend(self.parameters.iter().map(ParameterSpec::usage_fragment));
            parts.join(" ")
        });
        CommandSpec {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            usage,
            examples: self.examples,
            category: self.category,
            parameters: self.parameters,
            capabilities: self.capabilities,
            handler: Box::new(handler),
        }
    }
}

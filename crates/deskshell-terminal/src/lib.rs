//! Command dispatch core for the deskshell terminal.
//!
//! Commands are declarative specs: a name, aliases, typed parameters, the
//! capabilities they need, and a handler function. The registry resolves
//! the first token of an input line, binds the remaining tokens against the
//! command's parameters, and runs the handler. Every failure (unknown
//! command, bad argument, handler error or panic) comes back as a failed
//! `InvocationResult` rather than an error.

mod app_commands;
mod binder;
mod bluetooth_commands;
mod command;
mod commands;
mod environment;
mod network_commands;
mod notification_commands;
mod param;
mod registry;
mod system_commands;
#[cfg(test)]
pub(crate) mod test_utils;

/// Bind raw tokens against a command's parameters.
pub use binder::bind;
/// Per-invocation argument binding failure.
pub use binder::BindError;
/// Resolved arguments handed to a handler.
pub use binder::BoundArguments;
/// Trait implemented by every command handler.
pub use command::CommandHandler;
/// Output produced by a handler (text, table).
pub use command::CommandOutput;
/// Declarative description of one command.
pub use command::{CommandSpec, CommandSpecBuilder};
/// Outcome of one dispatch.
pub use command::InvocationResult;
/// Register every built-in command into a registry.
pub use commands::register_builtins;
/// Services available to handlers.
pub use environment::{Capability, Environment};
/// Parameter descriptions.
pub use param::{ParameterKind, ParameterSpec, PositionalPolicy};
/// Name/alias-keyed command table with dispatch.
pub use registry::{CommandRegistry, ConfigurationError, RegistryState};
/// Split an input line into tokens.
pub use registry::tokenize;

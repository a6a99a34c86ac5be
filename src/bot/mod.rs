/// Command definitions and their typed argument grammars
pub mod commands;
/// Update routing and per-command handlers
pub mod handlers;

/// Submodule defining the `help` command.
pub mod help;

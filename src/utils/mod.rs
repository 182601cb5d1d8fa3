//! This module aggregates various utility submodules used throughout the application.

/// Length-aware splitting of long replies.
pub mod chunker;

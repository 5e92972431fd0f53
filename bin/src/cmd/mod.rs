//! CLI subcommand modules.
//!
//! This module contains the implementations for all ronda CLI subcommands.

pub(crate) mod explain;
pub(crate) mod factors;
pub(crate) mod peers;
pub(crate) mod reset;
pub(crate) mod run;
pub(crate) mod show;

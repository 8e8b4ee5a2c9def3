//! Small cli/daemon that keeps a workstation awake. It watches how long the user has been
//! inactive and, once the AFK timeout is crossed, nudges the mouse along a tiny closed square so
//! the OS keeps seeing input without the cursor visibly going anywhere.
//!

pub mod cli;
pub mod daemon;
pub mod input_api;
pub mod utils;

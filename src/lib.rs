// Author: Dustin Pilgrim
// License: MIT

//! Cross-page inactivity monitor.
//!
//! Every page runs a [`daemon::Monitor`] that records user input into a shared
//! `IdleCheck` cookie, shows a countdown banner once the shared idle window
//! has passed, and redirects to the logout url when the countdown runs out.
//! Activity on any page that shares the cookie keeps all of them alive.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod daemon;
pub mod log;
pub mod services;

//! Atelier CLI library half: command implementations shared by the
//! `atelier` binary and its integration tests.

pub mod commands;

// Copyright 2026 Bookhound Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bookhound: a Telegram bot that finds books on trusted sites, digs the PDF
//! link out of the book page and sends the file back to the user.
//!
//! The library crate exposes the modules for the binary and integration tests.

pub mod acquisition;
pub mod bot;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod extraction;
pub mod renderer;
pub mod search;
pub mod telegram;

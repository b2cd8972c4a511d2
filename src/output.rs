// SPDX-License-Identifier: MIT OR Apache-2.0

//! Terminal output helpers shared by the subcommands

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::IsTerminal;

/// Colors only when stdout is a terminal and `NO_COLOR` is unset
pub fn use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    std::io::stdout().is_terminal()
}

/// Print a value as JSON, pretty unless `compact`
pub fn print_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", rendered);
    Ok(())
}

pub fn colorize_title(title: &str, use_color: bool) -> String {
    if use_color {
        title.bold().cyan().to_string()
    } else {
        title.to_string()
    }
}

pub fn colorize_meta(text: &str, use_color: bool) -> String {
    if use_color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

pub fn colorize_match(text: &str, use_color: bool) -> String {
    if use_color {
        text.yellow().bold().to_string()
    } else {
        format!("*{}*", text)
    }
}

pub fn colorize_notice(text: &str, use_color: bool) -> String {
    if use_color {
        text.red().to_string()
    } else {
        text.to_string()
    }
}

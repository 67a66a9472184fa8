// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod backup;
pub mod conflicts;
pub mod conversations;
pub mod features;
pub mod messages;
pub mod status;

use serde::Serialize;

use crate::error::Result;

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print each line, or `empty` when there are none.
pub fn print_lines(lines: impl IntoIterator<Item = String>, empty: &str) {
    let mut any = false;
    for line in lines {
        println!("{}", line);
        any = true;
    }
    if !any {
        println!("{}", empty);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

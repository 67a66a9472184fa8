// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help text generation with colorization support.

use crate::colors;
use clap::builder::styling::Styles;

/// Clap styles matching the [`colors`] palette.
pub fn styles() -> Styles {
    if !colors::should_colorize() {
        return Styles::plain();
    }

    use anstyle::{Ansi256Color, Color, Style};

    let header = Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(colors::codes::HEADER))));
    let literal = Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(colors::codes::LITERAL))));
    let context = Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(colors::codes::CONTEXT))));

    Styles::styled()
        .header(header)
        .usage(header)
        .literal(literal)
        .placeholder(context)
        .valid(context)
}

/// Main help template with a colorized Options header.
pub fn template() -> String {
    format!(
        "{{about-with-newline}}
{{usage-heading}} {{usage}}

{{before-help}}{}
{{options}}{{after-help}}",
        colors::header("Options:")
    )
}

/// Commands list shown before options in main help.
pub fn commands() -> String {
    format!(
        "\
{header_messages}
  {send}           Store a message and send or queue it
  {sync}           Flush the offline queue
  {list}           List a feature's messages
  {pending}        Show the offline queue
  {retry}          Re-queue a failed message
  {status}         Show queue, store, and conflict status
  {cleanup}        Remove old messages

{header_sync}
  {conflicts}      Inspect and resolve conflicts
  {conversations}  Browse local conversations
  {features}       List features and talk to them

{header_setup}
  {export}         Back up the local store
  {import}         Restore a backup
  {completion}     Generate shell completions
",
        header_messages = colors::header("Messages:"),
        header_sync = colors::header("Sync:"),
        header_setup = colors::header("Setup:"),
        send = colors::literal("send"),
        sync = colors::literal("sync"),
        list = colors::literal("list"),
        pending = colors::literal("pending"),
        retry = colors::literal("retry"),
        status = colors::literal("status"),
        cleanup = colors::literal("cleanup"),
        conflicts = colors::literal("conflicts"),
        conversations = colors::literal("conversations"),
        features = colors::literal("features"),
        export = colors::literal("export"),
        import = colors::literal("import"),
        completion = colors::literal("completion"),
    )
}

/// Quickstart shown after options in main help.
pub fn quickstart() -> String {
    colors::examples(
        "\
Get started:
  tether send chat \"hello\"   Send a message, queued if offline
  tether pending             See what is waiting to sync
  tether sync                Send the queue now
  tether conflicts list      Review anything the server disagrees on",
    )
}

#[cfg(test)]
#[path = "help_tests.rs"]
mod tests;

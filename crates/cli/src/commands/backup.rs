// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tether_core::Snapshot;

use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::error::{Error, Result};

use super::print_json;

pub fn export(ctx: &AppContext, format: OutputFormat, path: &Path) -> Result<usize> {
    if path.is_dir() {
        return Err(Error::InvalidInput(format!("{} is a directory", path.display())));
    }
    let snapshot = ctx.store.export_data()?;
    let mut writer = BufWriter::new(File::create(path)?);
    snapshot.write_to(&mut writer)?;
    writer.flush()?;

    let count = snapshot.record_count();
    match format {
        OutputFormat::Json => {
            print_json(&serde_json::json!({ "path": path, "records": count }))?
        }
        OutputFormat::Text => println!("Exported {} record(s) to {}", count, path.display()),
    }
    Ok(count)
}

/// Merge a backup into the store, or replace the store with it, then reload
/// the offline queue.
pub fn import(ctx: &AppContext, format: OutputFormat, path: &Path, replace: bool) -> Result<usize> {
    let file = File::open(path)
        .map_err(|e| Error::InvalidInput(format!("cannot open {}: {}", path.display(), e)))?;
    let snapshot = Snapshot::read_from(BufReader::new(file))?;
    if replace {
        ctx.store.clear_database()?;
    }
    ctx.store.import_data(&snapshot)?;
    let queued = ctx.cache.reload_queue()?;

    let count = snapshot.record_count();
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "path": path,
            "records": count,
            "queued": queued,
        }))?,
        OutputFormat::Text => {
            println!("Imported {} record(s) from {} ({} queued)", count, path.display(), queued)
        }
    }
    Ok(count)
}

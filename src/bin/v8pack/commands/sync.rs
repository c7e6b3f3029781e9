//! `v8pack sync` command

use anyhow::Result;

use super::{config_for, source_options};
use crate::cli::SyncArgs;
use v8pack::ops::pipeline::sync_sources;
use v8pack::util::process::SystemRunner;

pub fn execute(args: SyncArgs) -> Result<()> {
    let config = config_for(&args.source.work_dir);
    let opts = source_options(&args.source, &config);

    let report = sync_sources(&SystemRunner, &opts)?;

    let commit = report.root.commit.as_deref().unwrap_or("unknown commit");
    eprintln!(
        "    Synced {} at {} ({} dependencies)",
        report.root.spec,
        commit,
        report.dependencies.len()
    );
    for dep in &report.dependencies {
        eprintln!("      {}", dep.spec);
    }

    Ok(())
}

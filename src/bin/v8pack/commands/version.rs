//! `v8pack version` command

use anyhow::Result;

use crate::cli::VersionArgs;
use v8pack::core::version::{normalize_token, resolve_source_root};

pub fn execute(args: VersionArgs) -> Result<()> {
    let version = resolve_source_root(&args.path)?;
    println!("{}", version);

    if let Some(token) = args.token {
        println!("{}", normalize_token(&token));
    }

    Ok(())
}

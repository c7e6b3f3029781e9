//! `v8pack defines` command

use anyhow::{anyhow, Result};

use crate::cli::DefinesArgs;
use v8pack::builder::defines::{extract_from_out_dir, render_fragment};
use v8pack::core::axis::Configuration;

pub fn execute(args: DefinesArgs) -> Result<()> {
    let defines = extract_from_out_dir(&args.out_dir)?;

    match args.msbuild {
        Some(configuration) => {
            let configuration: Configuration = configuration.parse().map_err(|e: String| anyhow!(e))?;
            println!("{}", render_fragment(configuration, &defines).trim());
        }
        None => {
            for define in &defines {
                println!("{}", define);
            }
        }
    }

    Ok(())
}

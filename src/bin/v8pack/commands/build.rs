//! `v8pack build` command

use anyhow::Result;

use super::{config_for, parse_axis, pick_tool, source_options};
use crate::cli::BuildArgs;
use v8pack::core::axis::{BuildMatrix, Configuration, LinkageMode, Platform};
use v8pack::core::options::BuildOptionSet;
use v8pack::ops::pipeline::run;
use v8pack::util::process::{find_python, SystemRunner};

pub fn execute(args: BuildArgs) -> Result<()> {
    let config = config_for(&args.source.work_dir);
    let mut opts = source_options(&args.source, &config);

    let platforms = parse_axis::<Platform>(&args.platforms)?;
    let configurations = parse_axis::<Configuration>(&args.configurations)?;
    let linkages = parse_axis::<LinkageMode>(&args.libs)?;
    opts.matrix = BuildMatrix::new(&platforms, &configurations, &linkages);
    opts.xp = args.xp;

    // Prebuilt tools ship next to the checkout
    let bin_dir = opts.work_dir.join("bin");
    let bundled = |name: &str| {
        let path = bin_dir.join(format!("{}.exe", name));
        if path.is_file() {
            path
        } else {
            name.into()
        }
    };
    opts.tools.gn = pick_tool(args.gn.as_ref(), config.tools.gn.as_ref(), bundled("gn"));
    opts.tools.ninja = pick_tool(args.ninja.as_ref(), config.tools.ninja.as_ref(), bundled("ninja"));
    opts.tools.nuget = pick_tool(args.nuget.as_ref(), config.tools.nuget.as_ref(), "nuget".into());
    opts.tools.python = pick_tool(
        args.python.as_ref(),
        config.tools.python.as_ref(),
        find_python().unwrap_or_else(|| "python".into()),
    );

    // gn options: built-in base, then config, then --gn-option
    opts.base_options = BuildOptionSet::base();
    opts.base_options.merge(&config.gn.options);
    opts.gn_overrides = args.gn_options.into_iter().collect();

    opts.package_dir = args.packages_dir.or(config.package.dir.clone());
    opts.output_dir = args.output_dir.or(config.package.output_dir.clone());
    opts.skip_sync = args.skip_sync;

    tracing::debug!("build options: {:?}", opts);

    let report = run(&SystemRunner, &opts)?;

    eprintln!(
        "    Packaged V8 {} ({}) with toolset {}: {}",
        report.version,
        report.version_token,
        report.toolset.id,
        report.packages.join(", ")
    );

    Ok(())
}

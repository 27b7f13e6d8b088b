//! `strata synth` command

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use strata_core::{build_app, paths, Config, ManifestParser};

/// Synthesize templates from a manifest into the output directory.
pub fn synth(file: &str, target: Option<&str>, out: Option<&str>) -> Result<()> {
    let manifest = ManifestParser::parse_file(file).context("Failed to parse stack manifest")?;
    let config = Config::load().context("Failed to load config")?;

    let app = build_app(&manifest, &config, target)?;

    println!(
        "{} Synthesizing {} stack(s) for account {} in {}",
        "→".cyan().bold(),
        app.stacks().len(),
        app.environment().account.bold(),
        app.environment().region.bold()
    );

    let out_dir = out.map(Path::new).map(Path::to_path_buf).unwrap_or_else(paths::default_out_dir);
    let written = app.synth(&out_dir)?;

    for path in &written {
        println!("  {} {}", "•".dimmed(), path.display());
    }
    println!("{} Wrote {} template(s) to {}", "✓".green().bold(), written.len(), out_dir.display());

    Ok(())
}

//! `strata validate` command

use anyhow::Result;
use colored::Colorize;
use strata_core::ManifestParser;

/// Parse and validate a manifest, reporting what it declares.
pub fn validate(file: &str) -> Result<()> {
    let manifest = match ManifestParser::parse_file(file) {
        Ok(manifest) => manifest,
        Err(err) => {
            println!("{} {}", "✗".red().bold(), err);
            std::process::exit(1);
        }
    };

    let compute = manifest.compute_stacks().count();
    let services = manifest.service_stacks().count();
    println!(
        "{} {} is valid: {} compute stack(s), {} service stack(s)",
        "✓".green().bold(),
        file.bold(),
        compute,
        services
    );

    Ok(())
}

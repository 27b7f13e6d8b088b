//! `strata targets` command

use anyhow::{Context, Result};
use colored::Colorize;
use strata_core::Config;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ACCOUNT")]
    account: String,
    #[tabled(rename = "REGION")]
    region: String,
    #[tabled(rename = "VPC")]
    vpc: String,
    #[tabled(rename = "DEFAULT")]
    default: String,
}

/// List deployment targets from the local config.
pub fn targets() -> Result<()> {
    let config = Config::load().context("Failed to load config")?;

    if config.targets.is_empty() {
        println!("No targets configured");
        println!(
            "Add one to {} under {}",
            strata_core::paths::config_path().display().to_string().bold(),
            "targets".bold()
        );
        return Ok(());
    }

    let rows: Vec<TargetRow> = config
        .targets
        .iter()
        .map(|(name, target)| TargetRow {
            name: name.clone(),
            account: target.account.clone(),
            region: target.region.clone(),
            vpc: target.vpc_id.clone(),
            default: if config.default_target.as_deref() == Some(name.as_str()) {
                "✓".to_string()
            } else {
                String::new()
            },
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);

    Ok(())
}

//! `strata resources` command

use anyhow::{Context, Result};
use strata_core::{build_app, Config, ManifestParser};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "STACK")]
    stack: String,
    #[tabled(rename = "LOGICAL ID")]
    logical_id: String,
    #[tabled(rename = "TYPE")]
    resource_type: String,
}

/// List the resources the manifest declares, per stack.
pub fn resources(file: &str, stack: Option<&str>, target: Option<&str>) -> Result<()> {
    let manifest = ManifestParser::parse_file(file).context("Failed to parse stack manifest")?;
    let config = Config::load().context("Failed to load config")?;

    let app = build_app(&manifest, &config, target)?;

    let mut rows = Vec::new();
    for built in app.stacks() {
        if stack.is_some_and(|name| name != built.name()) {
            continue;
        }
        for (logical_id, resource) in built.resources() {
            rows.push(ResourceRow {
                stack: built.name().to_string(),
                logical_id: logical_id.clone(),
                resource_type: resource.resource_type.clone(),
            });
        }
    }

    if rows.is_empty() {
        println!("No resources declared");
        return Ok(());
    }

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{}", table);

    Ok(())
}

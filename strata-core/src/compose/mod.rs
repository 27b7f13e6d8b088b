//! Composers that turn a parsed manifest into declared stacks.
//!
//! Compute stacks are composed first so their exports exist before any
//! service stack imports them. Stacks of the same kind are composed in
//! name order, which keeps synthesized output stable across runs.

pub mod compute;
pub mod service;

pub use compute::{ComputeExports, ContainerCompute};
pub use service::ContainerService;

use std::collections::BTreeMap;

use crate::config::{Config, TargetConfig};
use crate::error::{Result, StrataError};
use crate::manifest::Manifest;
use crate::template::{App, Environment, Stack};
use tracing::{info, instrument};

/// Resolve the deployment target for a build.
///
/// Targets declared in the manifest shadow same-named targets from the
/// local config. With no explicit name, the config's default target is
/// used, falling back to a sole declared target.
pub fn resolve_target(
    manifest: &Manifest,
    config: &Config,
    name: Option<&str>,
) -> Result<(String, TargetConfig)> {
    let mut merged: BTreeMap<String, TargetConfig> = config.targets.clone();
    merged.extend(manifest.targets.clone());

    let name = match name {
        Some(name) => name.to_string(),
        None => match &config.default_target {
            Some(name) => name.clone(),
            None if merged.len() == 1 => merged.keys().next().cloned().unwrap_or_default(),
            None => return Err(StrataError::NoTarget),
        },
    };

    match merged.remove(&name) {
        Some(target) => Ok((name, target)),
        None => Err(StrataError::UnknownTarget { target: name }),
    }
}

/// Build the full application from a manifest: one stack per manifest
/// entry, compute stacks before the service stacks that depend on them.
#[instrument(skip(manifest, config))]
pub fn build_app(manifest: &Manifest, config: &Config, target: Option<&str>) -> Result<App> {
    let (target_name, target) = resolve_target(manifest, config, target)?;
    info!(deploy_target = %target_name, stacks = manifest.stacks.len(), "Building stacks");

    let mut app = App::new(Environment {
        account: target.account.clone(),
        region: target.region.clone(),
    });

    let mut exports: BTreeMap<String, ComputeExports> = BTreeMap::new();
    for (name, spec) in manifest.compute_stacks() {
        let mut stack = Stack::new(name);
        stack.set_description(format!("Container compute stack '{}'", name));
        let compute = ContainerCompute::compose(&mut stack, spec, &target)?;
        exports.insert(name.to_string(), compute.exports().clone());
        app.add_stack(stack)?;
    }

    for (name, spec) in manifest.service_stacks() {
        let compute_exports =
            exports.get(&spec.compute).ok_or_else(|| StrataError::UnknownComputeStack {
                stack: name.to_string(),
                compute: spec.compute.clone(),
            })?;
        let mut stack = Stack::new(name);
        stack.set_description(format!("Container service stack '{}'", name));
        ContainerService::compose(&mut stack, spec, compute_exports, &target)?;
        app.add_stack(stack)?;
    }

    Ok(app)
}

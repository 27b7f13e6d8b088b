//! Application context: environment plus built stacks, and artifact
//! emission.

use crate::error::{Result, StrataError};
use crate::template::stack::Stack;
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Deployment environment: target account and region.
#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    /// Account identifier
    pub account: String,

    /// Region name
    pub region: String,
}

/// Top-level application context.
///
/// Stacks are built against an `App` and then emitted in one pass; the
/// control flow is linear by design.
#[derive(Debug)]
pub struct App {
    environment: Environment,
    stacks: Vec<Stack>,
}

impl App {
    /// Create an application context for one deployment environment.
    pub fn new(environment: Environment) -> Self {
        Self { environment, stacks: Vec::new() }
    }

    /// Deployment environment.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Register a built stack. Stack names must be unique.
    pub fn add_stack(&mut self, stack: Stack) -> Result<()> {
        if self.stacks.iter().any(|s| s.name() == stack.name()) {
            return Err(StrataError::DuplicateStack { name: stack.name().to_string() });
        }
        self.stacks.push(stack);
        Ok(())
    }

    /// Built stacks in registration order.
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Look up a built stack by name.
    pub fn stack(&self, name: &str) -> Option<&Stack> {
        self.stacks.iter().find(|s| s.name() == name)
    }

    /// Write one template file per stack plus an assembly manifest into
    /// `out_dir`. Returns the written template paths.
    #[instrument(skip(self), fields(stacks = self.stacks.len()))]
    pub fn synth(&self, out_dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(out_dir)
            .map_err(|e| StrataError::IoError { path: out_dir.to_path_buf(), source: e })?;

        let mut written = Vec::new();
        for stack in &self.stacks {
            let file_name = format!("{}.template.json", stack.name());
            let path = out_dir.join(&file_name);
            let json = stack.template().to_json()?;
            std::fs::write(&path, json)
                .map_err(|e| StrataError::IoError { path: path.clone(), source: e })?;

            info!(stack = %stack.name(), resources = stack.len(), "Wrote template");
            written.push(path);
        }

        let assembly = json!({
            "version": env!("CARGO_PKG_VERSION"),
            "environment": self.environment,
            "stacks": self
                .stacks
                .iter()
                .map(|s| json!({ "name": s.name(), "template": format!("{}.template.json", s.name()) }))
                .collect::<Vec<_>>(),
        });
        let manifest_path = out_dir.join("manifest.json");
        let content = serde_json::to_string_pretty(&assembly)
            .map_err(|e| StrataError::TemplateSerialization { reason: e.to_string() })?;
        std::fs::write(&manifest_path, content)
            .map_err(|e| StrataError::IoError { path: manifest_path, source: e })?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn env() -> Environment {
        Environment { account: "111111111111".to_string(), region: "us-east-1".to_string() }
    }

    #[test]
    fn test_duplicate_stack_rejected() {
        let mut app = App::new(env());
        app.add_stack(Stack::new("core")).unwrap();

        let result = app.add_stack(Stack::new("core"));
        assert!(matches!(result, Err(StrataError::DuplicateStack { .. })));
    }

    #[test]
    fn test_synth_writes_templates_and_manifest() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(env());

        let mut stack = Stack::new("core");
        stack
            .add_resource("EcsCluster", "AWS::ECS::Cluster", json!({ "ClusterName": "demo" }))
            .unwrap();
        app.add_stack(stack).unwrap();

        let written = app.synth(dir.path()).unwrap();
        assert_eq!(written.len(), 1);
        assert!(dir.path().join("core.template.json").exists());
        assert!(dir.path().join("manifest.json").exists());

        let content = std::fs::read_to_string(dir.path().join("core.template.json")).unwrap();
        assert!(content.contains("AWS::ECS::Cluster"));
    }
}

//! Stack: a named bundle of declared resources.

use crate::error::{Result, StrataError};
use crate::template::value;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A single declared resource.
#[derive(Debug, Clone, Serialize)]
pub struct Resource {
    /// Provider resource type (e.g. "AWS::ECS::Cluster")
    #[serde(rename = "Type")]
    pub resource_type: String,

    /// Resource properties
    #[serde(rename = "Properties")]
    pub properties: Value,

    /// Logical ids this resource must be created after
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// Handle to a declared resource, usable by later composers.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    logical_id: String,
    resource_type: String,
}

impl ResourceHandle {
    /// Logical id of the declaration.
    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// Provider resource type of the declaration.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// `Ref` intrinsic pointing at this resource.
    pub fn reference(&self) -> Value {
        value::reference(&self.logical_id)
    }

    /// `Fn::GetAtt` intrinsic for one of this resource's attributes.
    pub fn attribute(&self, name: &str) -> Value {
        value::get_att(&self.logical_id, name)
    }
}

/// A stack output, optionally exported for other stacks to import.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    #[serde(rename = "Value")]
    pub value: Value,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Export", skip_serializing_if = "Option::is_none")]
    pub export: Option<Export>,
}

/// Export record inside an output.
#[derive(Debug, Clone, Serialize)]
pub struct Export {
    #[serde(rename = "Name")]
    pub name: String,
}

/// A named, independently deployable bundle of declared resources.
///
/// Resources are keyed by logical id in a `BTreeMap` so repeated synthesis
/// of the same input produces an identical template.
#[derive(Debug, Clone)]
pub struct Stack {
    name: String,
    description: Option<String>,
    resources: BTreeMap<String, Resource>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    /// Create an empty stack.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), description: None, resources: BTreeMap::new(), outputs: BTreeMap::new() }
    }

    /// Set the template description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Stack name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a resource and return a handle to it.
    pub fn add_resource(
        &mut self,
        logical_id: &str,
        resource_type: &str,
        properties: Value,
    ) -> Result<ResourceHandle> {
        if self.resources.contains_key(logical_id) {
            return Err(StrataError::DuplicateLogicalId {
                stack: self.name.clone(),
                logical_id: logical_id.to_string(),
            });
        }

        self.resources.insert(
            logical_id.to_string(),
            Resource {
                resource_type: resource_type.to_string(),
                properties,
                depends_on: Vec::new(),
            },
        );

        Ok(ResourceHandle {
            logical_id: logical_id.to_string(),
            resource_type: resource_type.to_string(),
        })
    }

    /// Record an explicit creation-order dependency between two declared
    /// resources.
    pub fn add_dependency(&mut self, resource: &ResourceHandle, depends_on: &ResourceHandle) {
        if let Some(r) = self.resources.get_mut(resource.logical_id()) {
            let id = depends_on.logical_id().to_string();
            if !r.depends_on.contains(&id) {
                r.depends_on.push(id);
            }
        }
    }

    /// Add an output, optionally exported under `export_name`.
    pub fn add_output(
        &mut self,
        name: &str,
        value: Value,
        description: Option<String>,
        export_name: Option<String>,
    ) {
        self.outputs.insert(
            name.to_string(),
            Output { value, description, export: export_name.map(|name| Export { name }) },
        );
    }

    /// Whether a logical id is declared in this stack.
    pub fn contains(&self, logical_id: &str) -> bool {
        self.resources.contains_key(logical_id)
    }

    /// Iterate declared resources in logical-id order.
    pub fn resources(&self) -> impl Iterator<Item = (&String, &Resource)> {
        self.resources.iter()
    }

    /// Number of declared resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether the stack declares no resources.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Serialize the declared graph into a provider-format template.
    pub fn template(&self) -> Template {
        Template {
            format_version: "2010-09-09".to_string(),
            description: self.description.clone(),
            resources: self.resources.clone(),
            outputs: self.outputs.clone(),
        }
    }
}

/// Provider-format template document.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, Resource>,

    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, Output>,
}

impl Template {
    /// Pretty-printed JSON rendering of the template.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StrataError::TemplateSerialization { reason: e.to_string() })
    }
}

//! Intrinsic value helpers.
//!
//! Thin constructors for the provider's intrinsic functions, so composers
//! can wire one declared resource into another's properties.

use serde_json::{json, Value};

/// Reference to a declared resource by logical id.
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// Runtime attribute of a declared resource.
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// Value exported by another stack in the same deployment.
pub fn import_value(export_name: &str) -> Value {
    json!({ "Fn::ImportValue": export_name })
}

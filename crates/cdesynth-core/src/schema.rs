use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::template::Template;

/// Emit the JSON Schema for template documents.
pub fn template_json_schema() -> RootSchema {
    schema_for!(Template)
}

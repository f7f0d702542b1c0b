use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Column holding the definition name (the key).
pub const NAME_COLUMN: &str = "DEFINITION_NAME";
/// Column holding the DSL body.
pub const DEFINITION_COLUMN: &str = "DEFINITION";
/// Hidden column holding the owning principal's name.
pub const OWNER_COLUMN: &str = "CREATOR";

/// A named task definition: a DSL string registered under a unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub name: String,
    pub dsl_text: String,
}

impl TaskDefinition {
    pub fn new(name: impl Into<String>, dsl_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dsl_text: dsl_text.into(),
        }
    }
}

impl Entity for TaskDefinition {
    fn table_name() -> &'static str {
        "DEFINITIONS"
    }

    fn id_column() -> &'static str {
        NAME_COLUMN
    }

    fn columns() -> &'static [&'static str] {
        &[NAME_COLUMN, DEFINITION_COLUMN]
    }
}

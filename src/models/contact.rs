use serde::{Deserialize, Serialize};

/// A contact together with its phone numbers, as collected from the
/// platform contacts index. Collection only emits contacts that actually
/// have at least one number, so an empty `phone_numbers` never appears in
/// collector output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub name: String,
    /// Numbers in the order the platform index lists them.
    pub phone_numbers: Vec<String>,
}

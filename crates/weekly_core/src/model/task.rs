use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Link type tag for tasks that carry no external action.
pub const NONE_LINK: &str = "none";

/// Link-specific payload, e.g. `phone`/`message` for a chat link.
pub type LinkData = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default = "default_link_type")]
    pub link_type: String,
    #[serde(default)]
    pub link_data: LinkData,
    #[serde(default)]
    pub order: usize,
}

impl Task {
    pub fn has_link(&self) -> bool {
        self.link_type != NONE_LINK
    }
}

fn default_link_type() -> String {
    NONE_LINK.to_string()
}

/// Fields accepted by an update. `id` and `order` are not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub link_type: Option<String>,
    pub link_data: Option<LinkData>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.link_type.is_none() && self.link_data.is_none()
    }
}

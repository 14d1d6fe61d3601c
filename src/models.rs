use serde::{Deserialize, Serialize};

/// One entry of the `/todos` resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Todo {
    pub id: u64,

    /// Owner of the todo. Some mirrors omit it.
    #[serde(default, rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    pub title: String,

    pub completed: bool,
}

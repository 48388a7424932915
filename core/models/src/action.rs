use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Operation requested on a resource and checked by the policy-decision service.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Archive,
    Create,
    CreateMany,
    Delete,
    DeleteMany,
    Find,
    FindMany,
    Update,
    UpdateMany,
}

impl Action {
    /// Wire name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Archive => "archive",
            Action::Create => "create",
            Action::CreateMany => "create_many",
            Action::Delete => "delete",
            Action::DeleteMany => "delete_many",
            Action::Find => "find",
            Action::FindMany => "find_many",
            Action::Update => "update",
            Action::UpdateMany => "update_many",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

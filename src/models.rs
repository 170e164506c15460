use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    pub id: String,
    pub name: String,
}

/// A project a merged sheet can be assigned to. Projects are the groups of
/// the merge step and developers their parents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub developer_id: String,
    pub developer_name: String,
    pub is_super: bool,
    pub fake: bool,
    pub not_launched: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectsData {
    pub developers: Vec<Developer>,
    pub projects: Vec<Project>,
}

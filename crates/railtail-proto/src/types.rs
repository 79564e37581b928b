//! Result shapes of the metadata queries.

use serde::Deserialize;

/// `data` of the [`ENVIRONMENT`](crate::queries::ENVIRONMENT) query.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EnvironmentData {
    /// The queried environment.
    pub environment: EnvironmentInfo,
}

/// An environment and its owning project.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    /// Environment id.
    pub id: String,
    /// Owning project id.
    pub project_id: String,
}

/// `data` of the [`PROJECT`](crate::queries::PROJECT) query.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectData {
    /// The queried project.
    pub project: ProjectInfo,
}

/// A project with its services and environments.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ProjectInfo {
    /// Project id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Services of the project.
    #[serde(default)]
    pub services: NodeConnection,
    /// Environments of the project.
    #[serde(default)]
    pub environments: NodeConnection,
}

/// A relay-style connection of named nodes.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct NodeConnection {
    /// Connection edges.
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// One connection edge.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Edge {
    /// The node.
    pub node: NamedNode,
}

/// An entity with an id and a display name.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NamedNode {
    /// Opaque id.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl NodeConnection {
    /// Iterate over the nodes of the connection.
    pub fn nodes(&self) -> impl Iterator<Item = &NamedNode> {
        self.edges.iter().map(|edge| &edge.node)
    }
}

//! GraphQL documents sent to the provider.

/// Streams environment logs, optionally preceded by a backlog of
/// `beforeLimit` records older than `beforeDate`.
pub const STREAM_ENVIRONMENT_LOGS: &str = r"subscription streamEnvironmentLogs($environmentId: String!, $filter: String, $beforeLimit: Int!, $beforeDate: String) {
  environmentLogs(environmentId: $environmentId, filter: $filter, beforeLimit: $beforeLimit, beforeDate: $beforeDate) {
    timestamp
    message
    severity
    tags {
      projectId
      environmentId
      serviceId
      deploymentId
      deploymentInstanceId
    }
    attributes {
      key
      value
    }
  }
}";

/// Resolves the project that owns an environment.
pub const ENVIRONMENT: &str = r"query environment($id: String!) {
  environment(id: $id) {
    id
    projectId
  }
}";

/// Lists a project's services and environments.
pub const PROJECT: &str = r"query project($id: String!) {
  project(id: $id) {
    id
    name
    services {
      edges {
        node {
          id
          name
        }
      }
    }
    environments {
      edges {
        node {
          id
          name
        }
      }
    }
  }
}";

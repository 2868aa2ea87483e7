//! Listing dialects and their page shapes
//!
//! - catalog: Docker Registry v2 `GET /v2/_catalog`
//! - namespaced: Docker Trusted Registry `GET /api/v0/repositories/`
//! - projects: Harbor `GET /api/projects` then `GET /api/repositories?project_id=N`

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Catalog,
    Namespaced,
    Projects,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Catalog => write!(f, "registry catalog API"),
            Dialect::Namespaced => write!(f, "DTR repositories API"),
            Dialect::Projects => write!(f, "Harbor projects API"),
        }
    }
}

/// `/v2/_catalog` page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl CatalogPage {
    pub fn into_names(self) -> Vec<String> {
        self.repositories
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamespacedRepository {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// `/api/v0/repositories/` page
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NamespacedPage {
    #[serde(default)]
    pub repositories: Vec<NamespacedRepository>,
}

impl NamespacedPage {
    pub fn into_names(self) -> Vec<String> {
        self.repositories
            .into_iter()
            .map(|r| format!("{}/{}", r.namespace, r.name))
            .collect()
    }
}

/// One `/api/projects` entry; other fields are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub project_id: i64,
    #[serde(default)]
    pub repo_count: i64,
}

/// One `/api/repositories` entry, already scoped by its project
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRepository {
    pub name: String,
}

pub type ProjectsPage = Vec<Project>;
pub type ProjectRepositoriesPage = Vec<ProjectRepository>;

/// Well-known listing URLs under a registry base
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
    page_size: Option<u32>,
}

impl Endpoints {
    pub fn new(base: &str, page_size: Option<u32>) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            page_size,
        }
    }

    pub fn catalog(&self) -> String {
        match self.page_size {
            Some(n) => format!("{}/v2/_catalog?n={}", self.base, n),
            None => format!("{}/v2/_catalog", self.base),
        }
    }

    pub fn namespaced(&self) -> String {
        match self.page_size {
            Some(n) => format!("{}/api/v0/repositories/?pageSize={}", self.base, n),
            None => format!("{}/api/v0/repositories/", self.base),
        }
    }

    pub fn projects(&self) -> String {
        match self.page_size {
            Some(n) => format!("{}/api/projects?page_size={}", self.base, n),
            None => format!("{}/api/projects", self.base),
        }
    }

    pub fn project_repositories(&self, project_id: i64) -> String {
        match self.page_size {
            Some(n) => format!(
                "{}/api/repositories?project_id={}&page_size={}",
                self.base, project_id, n
            ),
            None => format!("{}/api/repositories?project_id={}", self.base, project_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_without_page_size() {
        let e = Endpoints::new("https://harbor.example.com/", None);
        assert_eq!(e.catalog(), "https://harbor.example.com/v2/_catalog");
        assert_eq!(e.namespaced(), "https://harbor.example.com/api/v0/repositories/");
        assert_eq!(e.projects(), "https://harbor.example.com/api/projects");
        assert_eq!(
            e.project_repositories(7),
            "https://harbor.example.com/api/repositories?project_id=7"
        );
    }

    #[test]
    fn test_endpoints_with_page_size() {
        let e = Endpoints::new("https://harbor.example.com", Some(50));
        assert_eq!(e.catalog(), "https://harbor.example.com/v2/_catalog?n=50");
        assert_eq!(e.projects(), "https://harbor.example.com/api/projects?page_size=50");
        assert_eq!(
            e.project_repositories(3),
            "https://harbor.example.com/api/repositories?project_id=3&page_size=50"
        );
    }

    #[test]
    fn test_namespaced_projection() {
        let page: NamespacedPage = serde_json::from_str(
            r#"{"repositories":[{"namespace":"admin","name":"web","status":"ok"},{"namespace":"ops","name":"db"}]}"#,
        )
        .unwrap();
        assert_eq!(page.into_names(), vec!["admin/web", "ops/db"]);
    }

    #[test]
    fn test_project_entries_ignore_extra_fields() {
        let projects: ProjectsPage = serde_json::from_str(
            r#"[{"project_id":1,"repo_count":0,"name":"library"},{"project_id":2,"repo_count":4,"public":true}]"#,
        )
        .unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[1].project_id, 2);
        assert_eq!(projects[1].repo_count, 4);
    }
}

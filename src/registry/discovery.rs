//! Repository discovery state machine
//!
//! Discovery starts at the catalog API. A 401 before any name was emitted
//! moves on to the next enabled dialect; once a dialect has emitted names,
//! any later error in it is final so a partial listing is never masked by a
//! fallback that would restart from scratch.

use crate::config::ListingConfig;
use crate::error::{RegistryError, Result};
use crate::logging::Logger;
use crate::registry::fetcher::{Page, PaginatedFetcher};
use crate::registry::listing::{
    CatalogPage, Dialect, Endpoints, NamespacedPage, ProjectRepositoriesPage, ProjectsPage,
};
use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub(crate) enum State {
    Catalog { url: String },
    Namespaced { url: String },
    Projects { url: String },
    ProjectRepositories { project_id: i64, url: String },
    Done,
    Failed(RegistryError),
}

/// Result of feeding one fetch outcome to the session
#[derive(Debug)]
pub(crate) struct Step {
    pub names: Vec<String>,
    pub next: State,
    /// Set when this step moved discovery to another dialect
    pub fallback: Option<Dialect>,
}

impl Step {
    fn to(next: State) -> Self {
        Self {
            names: Vec::new(),
            next,
            fallback: None,
        }
    }

    fn fail(err: RegistryError) -> Self {
        Self::to(State::Failed(err))
    }
}

/// Cursor state owned by the producing task
#[derive(Debug)]
pub(crate) struct Session {
    endpoints: Endpoints,
    namespaced_fallback: bool,
    project_fallback: bool,
    emitted_in_dialect: bool,
    emitted_in_projects: bool,
    fallback_error: Option<RegistryError>,
    pending_projects: VecDeque<i64>,
    projects_next: Option<String>,
}

impl Session {
    pub fn new(endpoints: Endpoints, listing: &ListingConfig) -> Self {
        Self {
            endpoints,
            namespaced_fallback: listing.namespaced_fallback,
            project_fallback: listing.project_fallback,
            emitted_in_dialect: false,
            emitted_in_projects: false,
            fallback_error: None,
            pending_projects: VecDeque::new(),
            projects_next: None,
        }
    }

    pub fn initial_state(&self) -> State {
        State::Catalog {
            url: self.endpoints.catalog(),
        }
    }

    pub fn on_catalog_page(&mut self, result: Result<Page<CatalogPage>>) -> Step {
        match result {
            Ok(page) => {
                let (body, next) = page.into_parts();
                self.emit_page(body.into_names(), next.map(|url| State::Catalog { url }))
            }
            Err(err) if err.is_unauthorized() && !self.emitted_in_dialect => {
                self.fall_back_from(Dialect::Catalog, err)
            }
            Err(err) => Step::fail(err),
        }
    }

    pub fn on_namespaced_page(&mut self, result: Result<Page<NamespacedPage>>) -> Step {
        match result {
            Ok(page) => {
                let (body, next) = page.into_parts();
                self.emit_page(body.into_names(), next.map(|url| State::Namespaced { url }))
            }
            Err(err) if !self.emitted_in_dialect => self.fall_back_from(Dialect::Namespaced, err),
            Err(err) => Step::fail(err),
        }
    }

    pub fn on_projects_page(&mut self, result: Result<Page<ProjectsPage>>) -> Step {
        match result {
            Ok(page) => {
                let (projects, next) = page.into_parts();
                self.pending_projects.extend(
                    projects
                        .into_iter()
                        .filter(|p| p.repo_count > 0)
                        .map(|p| p.project_id),
                );
                self.projects_next = next;
                Step::to(self.next_project_state())
            }
            Err(err) if !self.emitted_in_projects => {
                Step::fail(self.fallback_error.take().unwrap_or(err))
            }
            Err(err) => Step::fail(err),
        }
    }

    pub fn on_project_repositories_page(
        &mut self,
        project_id: i64,
        result: Result<Page<ProjectRepositoriesPage>>,
    ) -> Step {
        match result {
            Ok(page) => {
                let (repositories, next) = page.into_parts();
                let names: Vec<String> = repositories.into_iter().map(|r| r.name).collect();
                self.emitted_in_projects |= !names.is_empty();
                let next = match next {
                    Some(url) => State::ProjectRepositories { project_id, url },
                    None => self.next_project_state(),
                };
                Step {
                    names,
                    next,
                    fallback: None,
                }
            }
            Err(err) => Step::fail(err),
        }
    }

    fn emit_page(&mut self, names: Vec<String>, next: Option<State>) -> Step {
        self.emitted_in_dialect |= !names.is_empty();
        Step {
            names,
            next: next.unwrap_or(State::Done),
            fallback: None,
        }
    }

    /// Enter the next enabled dialect after `from`.
    ///
    /// The first dialect's error is retained and reported if nothing is left to try.
    fn fall_back_from(&mut self, from: Dialect, err: RegistryError) -> Step {
        let retained = self.fallback_error.take().unwrap_or(err);
        let candidates: &[Dialect] = match from {
            Dialect::Catalog => &[Dialect::Namespaced, Dialect::Projects],
            Dialect::Namespaced => &[Dialect::Projects],
            Dialect::Projects => &[],
        };

        let target = candidates.iter().copied().find(|d| match d {
            Dialect::Namespaced => self.namespaced_fallback,
            Dialect::Projects => self.project_fallback,
            Dialect::Catalog => false,
        });

        let next = match target {
            Some(Dialect::Namespaced) => State::Namespaced {
                url: self.endpoints.namespaced(),
            },
            Some(Dialect::Projects) => State::Projects {
                url: self.endpoints.projects(),
            },
            _ => return Step::fail(retained),
        };

        self.fallback_error = Some(retained);
        self.emitted_in_dialect = false;
        Step {
            names: Vec::new(),
            next,
            fallback: target,
        }
    }

    fn next_project_state(&mut self) -> State {
        if let Some(project_id) = self.pending_projects.pop_front() {
            State::ProjectRepositories {
                project_id,
                url: self.endpoints.project_repositories(project_id),
            }
        } else if let Some(url) = self.projects_next.take() {
            State::Projects { url }
        } else {
            State::Done
        }
    }
}

/// The single producer task behind a repository stream
pub(crate) struct Discovery {
    session: Session,
    fetcher: PaginatedFetcher,
    output: Logger,
}

impl Discovery {
    pub fn new(session: Session, fetcher: PaginatedFetcher, output: Logger) -> Self {
        Self {
            session,
            fetcher,
            output,
        }
    }

    pub async fn run(
        mut self,
        names: mpsc::Sender<String>,
        errors: oneshot::Sender<RegistryError>,
        cancel: CancellationToken,
    ) {
        let mut state = self.session.initial_state();
        let mut emitted = 0usize;

        loop {
            if cancel.is_cancelled() {
                self.output.debug("Repository discovery cancelled");
                return;
            }

            let step = match state {
                State::Done => {
                    self.output.verbose(&format!("Discovered {} repositories", emitted));
                    return;
                }
                State::Failed(err) => {
                    self.output.debug(&format!("Repository discovery failed: {}", err));
                    let _ = errors.send(err);
                    return;
                }
                State::Catalog { url } => {
                    let Some(result) = self.fetch::<CatalogPage>(&url, &cancel).await else {
                        return;
                    };
                    self.session.on_catalog_page(result)
                }
                State::Namespaced { url } => {
                    let Some(result) = self.fetch::<NamespacedPage>(&url, &cancel).await else {
                        return;
                    };
                    self.session.on_namespaced_page(result)
                }
                State::Projects { url } => {
                    let Some(result) = self.fetch::<ProjectsPage>(&url, &cancel).await else {
                        return;
                    };
                    self.session.on_projects_page(result)
                }
                State::ProjectRepositories { project_id, url } => {
                    let Some(result) = self.fetch::<ProjectRepositoriesPage>(&url, &cancel).await
                    else {
                        return;
                    };
                    self.session.on_project_repositories_page(project_id, result)
                }
            };

            if let Some(dialect) = step.fallback {
                self.output.verbose(&format!("Attempting {} fallback", dialect));
            }

            for name in step.names {
                if !handoff(&names, &cancel, name).await {
                    self.output.debug("Repository stream closed by consumer");
                    return;
                }
                emitted += 1;
            }
            state = step.next;
        }
    }

    /// `None` when cancelled before or during the request
    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Option<Result<Page<T>>> {
        if cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.fetcher.fetch::<T>(url) => Some(result),
        }
    }
}

/// Blocking handoff of one name; false once cancelled or the consumer is gone
async fn handoff(names: &mpsc::Sender<String>, cancel: &CancellationToken, name: String) -> bool {
    if cancel.is_cancelled() {
        return false;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = names.send(name) => sent.is_ok(),
    }
}

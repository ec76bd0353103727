//! Links organisation forks to mod projects through archive issues.
//!
//! Linking a fork opens an issue in the archives repository, labelled
//! `in-progress`, whose body points at the upstream repository and the mod's
//! project page. The fork, project, and issue are then recorded so later
//! lookups can find the archive issue for a fork.

use std::sync::Arc;

use minijinja::{Environment, context};
use thiserror::Error;

use crate::github::models::{CreatedIssue, NewIssue};
use crate::github::{GitHubError, RepositoryGateway, RepositorySlug};
use crate::persistence::{ModLink, ModLinkStore, PersistenceError};

/// Label applied to newly opened archive issues.
pub const IN_PROGRESS_LABEL: &str = "in-progress";

/// Default archive issue body.
pub const DEFAULT_ISSUE_TEMPLATE: &str = "\
## Upstream

- Repository: {{ repo }}
- CurseForge: {{ curseforge }}

## Progress

- [ ] Fork updated
- [ ] Pull request opened
- [ ] Pull request merged
";

/// Errors raised while linking a fork.
#[derive(Debug, Error)]
pub enum ModLinkError {
    /// The repository is not a fork, so there is no upstream to link.
    #[error("{0} is not a fork")]
    NotAFork(String),

    /// The issue template could not be rendered.
    #[error("issue template failed: {0}")]
    Template(String),

    /// GitHub rejected a lookup or the issue creation.
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The link could not be recorded.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Mod project a fork is linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModProject {
    /// Project id on the mod hosting site.
    pub id: u64,
    /// Display name, used as the issue title.
    pub name: String,
    /// Project page.
    pub website_url: String,
}

/// Opens archive issues for forks and records the links.
pub struct ModLinker {
    github: Arc<dyn RepositoryGateway>,
    store: ModLinkStore,
    organization: String,
    archives: RepositorySlug,
    template: String,
}

impl std::fmt::Debug for ModLinker {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ModLinker")
            .field("organization", &self.organization)
            .field("archives", &self.archives)
            .finish_non_exhaustive()
    }
}

impl ModLinker {
    /// Creates a linker using [`DEFAULT_ISSUE_TEMPLATE`].
    #[must_use]
    pub fn new(
        github: Arc<dyn RepositoryGateway>,
        store: ModLinkStore,
        organization: impl Into<String>,
        archives: RepositorySlug,
    ) -> Self {
        Self {
            github,
            store,
            organization: organization.into(),
            archives,
            template: DEFAULT_ISSUE_TEMPLATE.to_owned(),
        }
    }

    /// Replaces the issue body template.
    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Links `fork` to `project` and returns the archive issue.
    ///
    /// `fork` is either a bare repository name inside the organisation or
    /// a full `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns [`ModLinkError::NotAFork`] when the repository has no parent,
    /// or the failing template, GitHub, or storage error.
    pub async fn link(
        &self,
        fork: &str,
        project: &ModProject,
    ) -> Result<CreatedIssue, ModLinkError> {
        let slug = self.fork_slug(fork)?;
        let repository = self.github.repository(&slug).await?;
        let parent = repository
            .parent_html_url
            .ok_or_else(|| ModLinkError::NotAFork(repository.full_name.clone()))?;

        let body = render_issue_body(&self.template, &parent, &project.website_url)?;
        let issue = self
            .github
            .create_issue(
                &self.archives,
                &NewIssue {
                    title: project.name.clone(),
                    body,
                    labels: vec![IN_PROGRESS_LABEL.to_owned()],
                    assignees: Vec::new(),
                },
            )
            .await?;

        self.store.insert(
            &slug,
            &ModLink {
                project_id: project.id,
                issue: issue.number,
            },
        )?;
        tracing::info!(
            fork = %slug,
            project = project.id,
            issue = issue.number,
            "fork linked to archive issue"
        );
        Ok(issue)
    }

    fn fork_slug(&self, fork: &str) -> Result<RepositorySlug, GitHubError> {
        if fork.contains('/') {
            RepositorySlug::parse(fork)
        } else {
            RepositorySlug::parse(&format!("{}/{}", self.organization, fork.trim()))
        }
    }
}

/// Renders an archive issue body from `template`.
///
/// # Errors
///
/// Returns [`ModLinkError::Template`] when the template is invalid.
pub fn render_issue_body(
    template: &str,
    repo: &str,
    curseforge: &str,
) -> Result<String, ModLinkError> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|_| minijinja::AutoEscape::None);
    env.add_template("issue", template)
        .map_err(|error| ModLinkError::Template(error.to_string()))?;
    env.get_template("issue")
        .and_then(|compiled| compiled.render(context! { repo => repo, curseforge => curseforge }))
        .map_err(|error| ModLinkError::Template(error.to_string()))
}

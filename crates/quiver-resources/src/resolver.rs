//! Per-kind list/add/remove over the catalog and both install scopes.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use quiver_catalog::{Catalog, ResourceKind, ResourceManifestEntry};
use serde::Serialize;

use crate::error::ResourceError;
use crate::frontmatter::parse_template;
use crate::resource::{Resource, ResourceDetails, Scope, ValidationRules, validate};
use crate::shape::{Materialize, ResourceShape, shape_for};
use crate::store::ResourceStore;
use crate::suggest;

const SUGGESTION_LIMIT: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Skip the project scope.
    pub global: bool,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct AddOptions {
    pub global: bool,
    pub force: bool,
    pub dry_run: bool,
    pub skip_deps: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RemoveOptions {
    /// Only look in the global scope.
    pub global: bool,
}

/// All three tiers, uncollapsed. A name may appear in more than one.
#[derive(Debug, Default, Serialize)]
pub struct Listing {
    pub bundled: Vec<Resource>,
    pub project: Vec<Resource>,
    pub global: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DependencyOutcome {
    Installed { name: String, target: PathBuf },
    AlreadyInstalled { name: String },
    Failed { name: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOutcome {
    pub kind: ResourceKind,
    pub name: String,
    pub target: PathBuf,
    pub dry_run: bool,
    pub dependencies: Vec<DependencyOutcome>,
}

impl AddOutcome {
    #[must_use]
    pub fn has_failed_dependencies(&self) -> bool {
        self.dependencies
            .iter()
            .any(|d| matches!(d, DependencyOutcome::Failed { .. }))
    }
}

#[derive(Debug, Serialize)]
pub struct ResourceInfo {
    pub entry: Option<ResourceManifestEntry>,
    pub bundled: Option<Resource>,
    pub installed: Vec<Resource>,
}

struct Installed {
    target: PathBuf,
    dependencies: Vec<String>,
}

/// Resolution engine for one resource kind. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Resolver {
    kind: ResourceKind,
    catalog: Catalog,
    store: ResourceStore,
    rules: Arc<ValidationRules>,
}

impl Resolver {
    #[must_use]
    pub fn new(
        kind: ResourceKind,
        catalog: Catalog,
        store: ResourceStore,
        rules: ValidationRules,
    ) -> Self {
        Self {
            kind,
            catalog,
            store,
            rules: Arc::new(rules),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn shape(&self) -> &'static dyn ResourceShape {
        shape_for(self.kind)
    }

    /// Where `name` lives (or would live) in the chosen scope.
    #[must_use]
    pub fn target_path(&self, name: &str, global: bool) -> PathBuf {
        self.shape()
            .target_path(&self.store.kind_root(self.kind, global), name)
    }

    /// Bundled, project and global resources, scanned concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error only if a background scan task panics.
    pub async fn list(&self, options: &ListOptions) -> Result<Listing, ResourceError> {
        let bundled = {
            let this = self.clone();
            let category = options.category.clone();
            tokio::task::spawn_blocking(move || this.list_bundled(category.as_deref()))
        };
        let project = {
            let this = self.clone();
            let category = options.category.clone();
            let skip = options.global;
            tokio::task::spawn_blocking(move || {
                if skip {
                    Vec::new()
                } else {
                    this.list_installed(false, category.as_deref())
                }
            })
        };
        let global = {
            let this = self.clone();
            let category = options.category.clone();
            tokio::task::spawn_blocking(move || this.list_installed(true, category.as_deref()))
        };

        let (bundled, project, global) = tokio::try_join!(bundled, project, global)?;
        Ok(Listing {
            bundled,
            project,
            global,
        })
    }

    /// Catalog templates of this kind. Unreadable templates are logged and skipped.
    #[must_use]
    pub fn list_bundled(&self, category: Option<&str>) -> Vec<Resource> {
        self.catalog
            .load_manifest(self.kind)
            .resources
            .iter()
            .filter_map(|entry| match self.bundled_resource(entry) {
                Ok(r) => Some(r),
                Err(e) => {
                    tracing::warn!(kind = %self.kind, name = %entry.name, "skipping bundled template: {e}");
                    None
                }
            })
            .filter(|r| matches_category(r.category(), category))
            .collect()
    }

    fn bundled_resource(&self, entry: &ResourceManifestEntry) -> Result<Resource, ResourceError> {
        let content = self.catalog.load_template(self.kind, &entry.path)?;
        let path = Path::new(self.kind.catalog_dir()).join(&entry.path);
        let mut resource = Resource::parse(self.kind, &entry.name, &content, path, Scope::Bundled)
            .map_err(|reason| ResourceError::InvalidTemplate {
                name: entry.name.clone(),
                reason,
            })?;

        if resource.description.is_empty()
            && let Some(description) = &entry.description
        {
            resource.description.clone_from(description);
        }
        match &mut resource.details {
            ResourceDetails::Persona { category, .. } => {
                if category.is_none() {
                    category.clone_from(&entry.category);
                }
            }
            ResourceDetails::Skill {
                category, files, ..
            } => {
                if category.is_none() {
                    category.clone_from(&entry.category);
                }
                *files = self
                    .catalog
                    .list_auxiliary_files(self.kind, &entry.name)
                    .into_iter()
                    .map(PathBuf::from)
                    .collect();
            }
            ResourceDetails::Command { .. } => {}
        }
        Ok(resource)
    }

    /// Resources installed in one scope.
    #[must_use]
    pub fn list_installed(&self, global: bool, category: Option<&str>) -> Vec<Resource> {
        let root = self.store.kind_root(self.kind, global);
        self.shape()
            .scan(self.kind, &root, Scope::install(global))
            .into_iter()
            .filter(|r| matches_category(r.category(), category))
            .collect()
    }

    /// Install `name` from the catalog, then its declared dependencies.
    ///
    /// Dependencies are installed depth-first in declaration order with
    /// `quiet` forced on. A dependency failure is recorded in the outcome and
    /// logged; it never rolls back the parent. Each name is attempted at most
    /// once per call, so dependency cycles terminate.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`], [`ResourceError::AlreadyInstalled`]
    /// or [`ResourceError::InvalidTemplate`] before anything is written, or an
    /// IO error if the write fails.
    pub fn add(&self, name: &str, options: &AddOptions) -> Result<AddOutcome, ResourceError> {
        let installed = self.install_one(name, options)?;
        let mut outcome = AddOutcome {
            kind: self.kind,
            name: name.to_owned(),
            target: installed.target,
            dry_run: options.dry_run,
            dependencies: Vec::new(),
        };
        if options.skip_deps {
            return Ok(outcome);
        }

        let dep_options = AddOptions {
            quiet: true,
            skip_deps: true,
            ..*options
        };
        let mut visited: HashSet<String> = HashSet::from([name.to_owned()]);
        let mut stack: Vec<String> = installed.dependencies.into_iter().rev().collect();

        while let Some(dep) = stack.pop() {
            if !visited.insert(dep.clone()) {
                continue;
            }
            match self.install_one(&dep, &dep_options) {
                Ok(done) => {
                    stack.extend(done.dependencies.into_iter().rev());
                    outcome.dependencies.push(DependencyOutcome::Installed {
                        name: dep,
                        target: done.target,
                    });
                }
                Err(ResourceError::AlreadyInstalled { .. }) => {
                    tracing::debug!(kind = %self.kind, name = %dep, "dependency already installed");
                    outcome
                        .dependencies
                        .push(DependencyOutcome::AlreadyInstalled { name: dep });
                }
                Err(e) => {
                    tracing::warn!(kind = %self.kind, parent = %name, "dependency '{dep}' failed: {e}");
                    outcome.dependencies.push(DependencyOutcome::Failed {
                        name: dep,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(outcome)
    }

    fn install_one(&self, name: &str, options: &AddOptions) -> Result<Installed, ResourceError> {
        let Some(entry) = self.catalog.find(self.kind, name) else {
            return Err(ResourceError::NotFound {
                kind: self.kind,
                name: name.to_owned(),
                suggestions: self.find_similar(name, SUGGESTION_LIMIT),
            });
        };
        if !is_safe_identity(&entry.name) {
            return Err(ResourceError::InvalidTemplate {
                name: entry.name.clone(),
                reason: "name is not a safe relative path".into(),
            });
        }

        let target = self.target_path(&entry.name, options.global);
        if !options.force && ResourceStore::exists(&target) {
            return Err(ResourceError::AlreadyInstalled {
                kind: self.kind,
                name: entry.name,
                path: target,
            });
        }

        let content = self.catalog.load_template(self.kind, &entry.path)?;
        let parsed = parse_template(&content).map_err(|reason| ResourceError::InvalidTemplate {
            name: entry.name.clone(),
            reason,
        })?;
        validate(self.kind, &entry.name, &parsed.header, &self.rules).map_err(|reason| {
            ResourceError::InvalidTemplate {
                name: entry.name.clone(),
                reason,
            }
        })?;

        let dependencies = if entry.dependencies.is_empty() {
            parsed.header.get_list("dependencies")
        } else {
            entry.dependencies.clone()
        };

        if options.dry_run {
            tracing::debug!(kind = %self.kind, name = %entry.name, target = %target.display(), "dry run, nothing written");
            return Ok(Installed {
                target,
                dependencies,
            });
        }

        self.shape().materialize(&Materialize {
            catalog: &self.catalog,
            kind: self.kind,
            name: &entry.name,
            content: &content,
            target: &target,
            force: options.force,
        })?;

        if options.quiet {
            tracing::debug!(kind = %self.kind, name = %entry.name, target = %target.display(), "installed");
        } else {
            tracing::info!(kind = %self.kind, name = %entry.name, target = %target.display(), "installed");
        }
        Ok(Installed {
            target,
            dependencies,
        })
    }

    /// Installed copy of `name`: project scope first, then global. With
    /// `global_only`, the project scope is not consulted.
    #[must_use]
    pub fn locate_installed(&self, name: &str, global_only: bool) -> Option<(PathBuf, Scope)> {
        if !is_safe_identity(name) {
            return None;
        }
        let scopes: &[bool] = if global_only { &[true] } else { &[false, true] };
        scopes.iter().find_map(|&global| {
            let path = self.target_path(name, global);
            ResourceStore::exists(&path).then(|| (path, Scope::install(global)))
        })
    }

    #[must_use]
    pub fn is_installed(&self, name: &str, options: &RemoveOptions) -> bool {
        self.locate_installed(name, options.global).is_some()
    }

    /// Delete an installed copy, then prune directories it leaves empty.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotInstalled`] if no copy exists, or an IO
    /// error if deletion fails.
    pub fn remove(&self, name: &str, options: &RemoveOptions) -> Result<PathBuf, ResourceError> {
        let (path, scope) =
            self.locate_installed(name, options.global)
                .ok_or_else(|| ResourceError::NotInstalled {
                    kind: self.kind,
                    name: name.to_owned(),
                })?;

        ResourceStore::delete(&path)?;
        let root = self.store.kind_root(self.kind, scope == Scope::Global);
        ResourceStore::prune_empty_parents(&path, &root);

        tracing::info!(kind = %self.kind, name, scope = %scope, "removed");
        Ok(path)
    }

    /// Catalog names resembling `name`, best first.
    #[must_use]
    pub fn find_similar(&self, name: &str, limit: usize) -> Vec<String> {
        let names = self.catalog.names(self.kind);
        suggest::find_similar(name, names.iter().map(String::as_str), limit)
    }

    /// Catalog entry, parsed template and every installed copy of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] when `name` is neither in the
    /// catalog nor installed.
    pub fn info(&self, name: &str) -> Result<ResourceInfo, ResourceError> {
        let entry = self.catalog.find(self.kind, name);
        let bundled = entry.as_ref().and_then(|e| self.bundled_resource(e).ok());

        let installed: Vec<Resource> = if is_safe_identity(name) {
            [false, true]
                .into_iter()
                .filter_map(|global| {
                    let path = self.target_path(name, global);
                    if !ResourceStore::exists(&path) {
                        return None;
                    }
                    self.shape()
                        .load_installed(self.kind, name, &path, Scope::install(global))
                })
                .collect()
        } else {
            Vec::new()
        };

        if entry.is_none() && installed.is_empty() {
            return Err(ResourceError::NotFound {
                kind: self.kind,
                name: name.to_owned(),
                suggestions: self.find_similar(name, SUGGESTION_LIMIT),
            });
        }
        Ok(ResourceInfo {
            entry,
            bundled,
            installed,
        })
    }
}

fn matches_category(actual: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => actual.is_some_and(|a| a.eq_ignore_ascii_case(wanted)),
    }
}

/// Relative path made only of normal components.
fn is_safe_identity(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('\\')
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}

use std::fmt;
use std::path::PathBuf;

use quiver_catalog::ResourceKind;
use serde::Serialize;

use crate::frontmatter::{Header, parse_template};

const MAX_SKILL_NAME_LEN: usize = 64;
const MAX_SKILL_DESCRIPTION_LEN: usize = 1024;

/// Where a resource instance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Read-only catalog template.
    Bundled,
    /// Repository-local install.
    Project,
    /// User-wide install.
    Global,
}

impl Scope {
    #[must_use]
    pub fn install(global: bool) -> Self {
        if global { Self::Global } else { Self::Project }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bundled => f.write_str("bundled"),
            Self::Project => f.write_str("project"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// Kind-specific header fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ResourceDetails {
    #[serde(rename_all = "camelCase")]
    Persona {
        display_name: Option<String>,
        category: Option<String>,
        tools: Vec<String>,
        dependencies: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Skill {
        category: Option<String>,
        tags: Vec<String>,
        dependencies: Vec<String>,
        /// Non-manifest files under the skill directory, relative to it.
        files: Vec<PathBuf>,
    },
    #[serde(rename_all = "camelCase")]
    Command {
        namespace: Option<String>,
        argument_hint: Option<String>,
        allowed_tools: Vec<String>,
    },
}

/// A parsed persona, skill or command from any scope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub kind: ResourceKind,
    /// Identity key within the kind.
    pub name: String,
    pub description: String,
    pub scope: Scope,
    pub path: PathBuf,
    pub details: ResourceDetails,
    #[serde(skip)]
    pub header: Header,
    #[serde(skip)]
    pub body: String,
}

impl Resource {
    /// Parse `content` as a resource of `kind` identified by `name`.
    ///
    /// Performs no validation beyond header syntax; see [`validate`].
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the header block is malformed.
    pub fn parse(
        kind: ResourceKind,
        name: &str,
        content: &str,
        path: PathBuf,
        scope: Scope,
    ) -> Result<Self, String> {
        let parsed = parse_template(content)?;
        let header = parsed.header;

        let details = match kind {
            ResourceKind::Persona => ResourceDetails::Persona {
                display_name: header
                    .get_str("displayName")
                    .or_else(|| header.get_str("display_name")),
                category: header.get_str("category"),
                tools: header.get_list("tools"),
                dependencies: header.get_list("dependencies"),
            },
            ResourceKind::Skill => ResourceDetails::Skill {
                category: header.get_str("category"),
                tags: header.get_list("tags"),
                dependencies: header.get_list("dependencies"),
                files: Vec::new(),
            },
            ResourceKind::Command => ResourceDetails::Command {
                namespace: name.rsplit_once('/').map(|(ns, _)| ns.to_owned()),
                argument_hint: header.get_str("argument-hint"),
                allowed_tools: header.get_list("allowed-tools"),
            },
        };

        Ok(Self {
            kind,
            name: name.to_owned(),
            description: header.get_str("description").unwrap_or_default(),
            scope,
            path,
            details,
            header,
            body: parsed.body,
        })
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        match &self.details {
            ResourceDetails::Persona { category, .. } | ResourceDetails::Skill { category, .. } => {
                category.as_deref()
            }
            ResourceDetails::Command { namespace, .. } => namespace.as_deref(),
        }
    }

    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        match &self.details {
            ResourceDetails::Persona { dependencies, .. }
            | ResourceDetails::Skill { dependencies, .. } => dependencies,
            ResourceDetails::Command { .. } => &[],
        }
    }

    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        match &self.details {
            ResourceDetails::Skill { files, .. } => files,
            _ => &[],
        }
    }
}

/// Settings that shape per-kind validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRules {
    /// Words a skill name must not contain (host product names).
    pub reserved_words: Vec<String>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            reserved_words: vec!["anthropic".into(), "claude".into()],
        }
    }
}

/// Check a skill name: at most 64 chars of `[a-z0-9-]`, no leading or
/// trailing hyphen, and none of the reserved words.
///
/// # Errors
///
/// Returns the reason the name is rejected.
pub fn validate_skill_name(name: &str, rules: &ValidationRules) -> Result<(), String> {
    if name.is_empty() {
        return Err("name must not be empty".into());
    }
    if name.len() > MAX_SKILL_NAME_LEN {
        return Err(format!(
            "name must be at most {MAX_SKILL_NAME_LEN} characters, got {}",
            name.len()
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "name '{name}' may only contain lowercase letters, digits and hyphens"
        ));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(format!("name '{name}' must not start or end with a hyphen"));
    }
    if let Some(word) = rules
        .reserved_words
        .iter()
        .find(|w| !w.is_empty() && name.contains(&w.to_lowercase()))
    {
        return Err(format!("name '{name}' contains reserved word '{word}'"));
    }
    Ok(())
}

/// Check a command identity (`commit`, `git/commit`).
///
/// # Errors
///
/// Returns the reason the identity is rejected.
pub fn validate_command_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("command name must not be empty".into());
    }
    for segment in name.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(format!("command name '{name}' has an empty or relative segment"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(format!("command name '{name}' contains invalid characters"));
        }
    }
    Ok(())
}

/// Kind-specific validation of a catalog template about to be installed as `name`.
///
/// # Errors
///
/// Returns the reason the template is rejected.
pub fn validate(
    kind: ResourceKind,
    name: &str,
    header: &Header,
    rules: &ValidationRules,
) -> Result<(), String> {
    let description = header.get_str("description");

    match kind {
        ResourceKind::Persona => {
            let declared = header
                .get_str("name")
                .ok_or_else(|| "missing 'name' in header".to_owned())?;
            if declared != name {
                return Err(format!("header name '{declared}' does not match '{name}'"));
            }
            if description.is_none() {
                return Err("missing 'description' in header".into());
            }
            if name.contains('/') || name.contains('\\') || name.contains("..") {
                return Err(format!("invalid persona name: {name}"));
            }
            if header.is_non_textual("tools") {
                return Err("'tools' must be a string or a list of strings".into());
            }
        }
        ResourceKind::Skill => {
            let declared = header
                .get_str("name")
                .ok_or_else(|| "missing 'name' in header".to_owned())?;
            validate_skill_name(&declared, rules)?;
            if declared != name {
                return Err(format!("header name '{declared}' does not match '{name}'"));
            }
            let description =
                description.ok_or_else(|| "missing 'description' in header".to_owned())?;
            if description.chars().count() > MAX_SKILL_DESCRIPTION_LEN {
                return Err(format!(
                    "description must be at most {MAX_SKILL_DESCRIPTION_LEN} characters"
                ));
            }
        }
        ResourceKind::Command => {
            validate_command_name(name)?;
            if description.is_none() {
                return Err("missing 'description' in header".into());
            }
            if header.is_non_textual("argument-hint") {
                return Err("'argument-hint' must be a string".into());
            }
        }
    }
    Ok(())
}

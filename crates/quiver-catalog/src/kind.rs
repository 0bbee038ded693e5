use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of resource categories the catalog distributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Agent persona, a single markdown file.
    Persona,
    /// Skill directory: `SKILL.md` plus auxiliary files.
    Skill,
    /// Slash-command template, a single markdown file that may be namespaced.
    Command,
}

impl ResourceKind {
    pub const ALL: [Self; 3] = [Self::Persona, Self::Skill, Self::Command];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::Skill => "skill",
            Self::Command => "command",
        }
    }

    /// Subtree of the catalog holding this kind's index and templates.
    #[must_use]
    pub fn catalog_dir(self) -> &'static str {
        match self {
            Self::Persona => "personas",
            Self::Skill => "skills",
            Self::Command => "commands",
        }
    }

    /// Subtree of a scope root where installed copies live.
    #[must_use]
    pub fn install_dir(self) -> &'static str {
        match self {
            Self::Persona => "agents",
            Self::Skill => "skills",
            Self::Command => "commands",
        }
    }

    /// Directory-shaped kinds install as a folder instead of a single file.
    #[must_use]
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Skill)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_per_kind() {
        assert_eq!(ResourceKind::Persona.catalog_dir(), "personas");
        assert_eq!(ResourceKind::Persona.install_dir(), "agents");
        assert_eq!(ResourceKind::Skill.install_dir(), "skills");
        assert_eq!(ResourceKind::Command.catalog_dir(), "commands");
    }

    #[test]
    fn only_skills_are_directories() {
        assert!(ResourceKind::Skill.is_directory());
        assert!(!ResourceKind::Persona.is_directory());
        assert!(!ResourceKind::Command.is_directory());
    }

    #[test]
    fn serde_lowercase() {
        let json = serde_json::to_string(&ResourceKind::Command).unwrap();
        assert_eq!(json, "\"command\"");
    }
}

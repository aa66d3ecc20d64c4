//! Workspace specification.
//!
//! The narrow, typed input a caller hands to [`crate::session::SessionManager::open`].
//! Deliberately anemic: no yaml/json parsing, no discovery of a config file
//! on disk. That discovery step — finding and parsing a config file for a
//! given project — lives outside this crate; this is just the typed struct
//! the session layer actually consumes.

use std::collections::HashMap;
use std::path::PathBuf;

/// Terminal/write restrictions for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionRestrictions {
    /// If `false`, terminal (bash) capability is disabled.
    pub allow_terminal: bool,
    /// If set, file writes are restricted to only these paths. `None`
    /// means unrestricted.
    pub allowed_write_paths: Option<Vec<PathBuf>>,
}

impl SessionRestrictions {
    pub fn allows_write(&self, path: &std::path::Path) -> bool {
        match &self.allowed_write_paths {
            None => true,
            Some(allowed) => allowed.iter().any(|p| path.starts_with(p)),
        }
    }
}

/// Everything needed to start one workspace's session.
#[derive(Debug, Clone)]
pub struct WorkspaceSpec {
    pub agent_command: String,
    pub working_dir: PathBuf,
    pub env: HashMap<String, String>,
    pub restrictions: SessionRestrictions,
}

impl WorkspaceSpec {
    pub fn new(agent_command: impl Into<String>, working_dir: PathBuf) -> Self {
        Self {
            agent_command: agent_command.into(),
            working_dir,
            env: HashMap::new(),
            restrictions: SessionRestrictions::default(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn with_restrictions(mut self, restrictions: SessionRestrictions) -> Self {
        self.restrictions = restrictions;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_allowed_paths_permits_any_write() {
        let restrictions = SessionRestrictions::default();
        assert!(restrictions.allows_write(std::path::Path::new("/anywhere/f.txt")));
    }

    #[test]
    fn allowed_paths_restrict_to_prefix_match() {
        let restrictions = SessionRestrictions {
            allow_terminal: false,
            allowed_write_paths: Some(vec![PathBuf::from("/workspace")]),
        };
        assert!(restrictions.allows_write(std::path::Path::new("/workspace/f.txt")));
        assert!(!restrictions.allows_write(std::path::Path::new("/other/f.txt")));
    }
}

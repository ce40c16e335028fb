use anyhow::{Context, Result, anyhow};
use git2::{Repository, StatusOptions};
use std::path::Path;

/// Read-only view of the repository whose commit gets tested.
pub struct GitTracker {
    repo: Repository,
}

impl GitTracker {
    /// Open the repository containing `dir`, searching parent directories.
    pub fn discover(dir: &Path) -> Result<Self> {
        let repo = Repository::discover(dir).with_context(|| {
            format!(
                "{} is not inside a git repository. Run this command from your CodeCrafters repository",
                dir.display()
            )
        })?;
        Ok(Self { repo })
    }

    /// Get the HEAD commit if it exists (returns None for unborn branches)
    fn get_head_commit(&self) -> Option<git2::Commit<'_>> {
        self.repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
    }

    /// Get current HEAD SHA (returns None for unborn branches)
    pub fn head_sha(&self) -> Option<String> {
        self.get_head_commit().map(|c| c.id().to_string())
    }

    /// HEAD SHA, or an error explaining that there is nothing to test yet.
    pub fn require_head_sha(&self) -> Result<String> {
        self.head_sha()
            .ok_or_else(|| anyhow!("No commits found in this repository. Commit your changes first"))
    }

    /// Whether the working tree has changes that HEAD doesn't include.
    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).include_ignored(false);
        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .context("Failed to read git status")?;
        Ok(!statuses.is_empty())
    }
}

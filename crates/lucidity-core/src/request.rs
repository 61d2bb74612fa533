use serde::{Deserialize, Serialize};

/// What to analyze: a workspace identifier plus optional narrowing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Local path or remote reference, see [`lucidity_git::resolve`]
    pub workspace: String,
    /// Repository-relative file to restrict the diff to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `<ref>..<ref>` range; when absent the working tree is diffed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commits: Option<String>,
}

impl ChangeRequest {
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into()).filter(|p: &String| !p.is_empty());
        self
    }

    pub fn with_commits(mut self, commits: impl Into<String>) -> Self {
        self.commits = Some(commits.into()).filter(|c: &String| !c.is_empty());
        self
    }
}

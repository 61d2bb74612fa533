use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("workspace parameter is required")]
    MissingWorkspace,

    #[error("Repository error: {0}")]
    Repository(#[from] lucidity_git::RepoError),
}

impl AnalysisError {
    /// Whether the failure came from a workspace that looks like a path on
    /// this machine but could not be used as one
    pub fn is_local_path_problem(&self) -> bool {
        matches!(
            self,
            AnalysisError::Repository(lucidity_git::RepoError::MissingLocalPath(_))
        )
    }
}

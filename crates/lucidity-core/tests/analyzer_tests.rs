use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use git2::Repository;
use lucidity_core::{ChangeAnalyzer, ChangeReport, ChangeRequest};
use lucidity_exec::{CommandError, CommandOutput, GitRunner, RunOptions};
use lucidity_git::{CacheConfig, FileStatus, RepositoryCache};
use tempfile::TempDir;

const UNSTAGED: &str = "\
diff --git a/src/app.py b/src/app.py
index 83db48f..bf269f4 100644
--- a/src/app.py
+++ b/src/app.py
@@ -1,3 +1,3 @@
 def greet(name):
-    return 'hi ' + name
+    return f'hello {name}'
 
diff --git a/Cargo.lock b/Cargo.lock
index 1111111..2222222 100644
--- a/Cargo.lock
+++ b/Cargo.lock
@@ -1 +1 @@
-version = 1
+version = 2
";

const STAGED: &str = "\
diff --git a/docs/notes.md b/docs/notes.md
new file mode 100644
index 0000000..3b18e51
--- /dev/null
+++ b/docs/notes.md
@@ -0,0 +1,2 @@
+# Notes
+Remember to rotate the keys.
diff --git a/tiny.txt b/tiny.txt
index 1111111..2222222 100644
--- a/tiny.txt
+++ b/tiny.txt
@@ -1 +1 @@
-a
+b
";

/// Answers `git` invocations from a table keyed by the joined arguments.
#[derive(Default)]
struct CannedRunner {
    responses: HashMap<String, Result<String, i32>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl CannedRunner {
    fn respond(mut self, args: &str, stdout: &str) -> Self {
        self.responses.insert(args.to_string(), Ok(stdout.to_string()));
        self
    }

    fn fail(mut self, args: &str) -> Self {
        self.responses.insert(args.to_string(), Err(128));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|args| args.join(" "))
            .collect()
    }
}

#[async_trait]
impl GitRunner for CannedRunner {
    async fn run(
        &self,
        args: &[String],
        _working_dir: &Path,
        _options: RunOptions,
    ) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(args.to_vec());
        match self.responses.get(&args.join(" ")) {
            Some(Ok(stdout)) => Ok(CommandOutput::from_stdout(stdout.clone())),
            Some(Err(code)) => Err(CommandError::Failed {
                args: args.to_vec(),
                stderr: "fatal: bad revision".to_string(),
                exit_code: *code,
            }),
            None => Ok(CommandOutput::from_stdout("")),
        }
    }
}

struct Fixture {
    _dir: TempDir,
    repo: String,
    runner: Arc<CannedRunner>,
    analyzer: ChangeAnalyzer,
}

fn fixture(runner: CannedRunner) -> Fixture {
    let dir = TempDir::new().unwrap();
    let repo_dir = dir.path().join("work");
    Repository::init(&repo_dir).unwrap();

    let runner = Arc::new(runner);
    let cache = RepositoryCache::new(CacheConfig::new(dir.path().join("cache")), runner.clone());
    let analyzer = ChangeAnalyzer::new(Arc::new(cache));

    Fixture {
        repo: repo_dir.to_string_lossy().into_owned(),
        _dir: dir,
        runner,
        analyzer,
    }
}

#[tokio::test]
async fn test_working_tree_analysis() {
    let fx = fixture(
        CannedRunner::default()
            .respond("diff", UNSTAGED)
            .respond("diff --cached", STAGED),
    );

    let report = fx.analyzer.analyze(&ChangeRequest::new(&fx.repo)).await;

    let ChangeReport::Success {
        file_count,
        file_list,
        results,
        ..
    } = report
    else {
        panic!("expected success");
    };

    assert_eq!(
        file_list,
        vec!["src/app.py", "Cargo.lock", "docs/notes.md", "tiny.txt"]
    );
    // Cargo.lock is excluded, tiny.txt is below the size floor
    assert_eq!(file_count, 2);
    assert_eq!(results.keys().collect::<Vec<_>>(), vec!["src/app.py", "docs/notes.md"]);

    let app = &results["src/app.py"];
    assert_eq!(app.status, FileStatus::Modified);
    assert_eq!(app.language, "python");
    assert_eq!(app.original_code, "def greet(name):\n    return 'hi ' + name\n");
    assert_eq!(app.modified_code, "def greet(name):\n    return f'hello {name}'\n");
    assert!(app.raw_diff.starts_with("diff --git a/src/app.py b/src/app.py\n"));

    let notes = &results["docs/notes.md"];
    assert_eq!(notes.status, FileStatus::Added);
    assert_eq!(notes.language, "markdown");
    assert_eq!(notes.original_code, "");

    assert_eq!(fx.runner.calls(), vec!["diff", "diff --cached"]);
}

#[tokio::test]
async fn test_commit_range_uses_single_diff() {
    let fx = fixture(CannedRunner::default().respond("diff HEAD~1..HEAD -- src/app.py", UNSTAGED));

    let request = ChangeRequest::new(&fx.repo)
        .with_commits("HEAD~1..HEAD")
        .with_path("src\\app.py");
    let report = fx.analyzer.analyze(&request).await;

    assert!(report.is_success(), "{report:?}");
    assert_eq!(fx.runner.calls(), vec!["diff HEAD~1..HEAD -- src/app.py"]);
}

#[tokio::test]
async fn test_empty_working_tree_reports_no_changes() {
    let fx = fixture(CannedRunner::default());

    let report = fx.analyzer.analyze(&ChangeRequest::new(&fx.repo)).await;

    let ChangeReport::NoChanges { message, file_list } = report else {
        panic!("expected no_changes");
    };
    assert!(message.starts_with("No uncommitted changes detected"));
    assert!(file_list.is_empty());
}

#[tokio::test]
async fn test_empty_commit_range_names_the_range() {
    let fx = fixture(CannedRunner::default());

    let request = ChangeRequest::new(&fx.repo).with_commits("main..feature");
    let report = fx.analyzer.analyze(&request).await;

    let ChangeReport::NoChanges { message, .. } = report else {
        panic!("expected no_changes");
    };
    assert_eq!(message, "No changes detected in commit range: main..feature");
}

#[tokio::test]
async fn test_invalid_commit_range_runs_nothing() {
    let fx = fixture(CannedRunner::default());

    let (unstaged, staged) = fx
        .analyzer
        .collect_diff(Path::new(&fx.repo), None, Some("HEAD; rm -rf /"))
        .await;

    assert_eq!((unstaged.as_str(), staged.as_str()), ("", ""));
    assert!(fx.runner.calls().is_empty());
}

#[tokio::test]
async fn test_invalid_path_runs_nothing() {
    let fx = fixture(CannedRunner::default());

    let (unstaged, staged) = fx
        .analyzer
        .collect_diff(Path::new(&fx.repo), Some("../outside"), None)
        .await;

    assert!(unstaged.is_empty() && staged.is_empty());
    assert!(fx.runner.calls().is_empty());
}

#[tokio::test]
async fn test_failed_diff_yields_empty_pair() {
    let fx = fixture(
        CannedRunner::default()
            .respond("diff", UNSTAGED)
            .fail("diff --cached"),
    );

    let (unstaged, staged) = fx.analyzer.collect_diff(Path::new(&fx.repo), None, None).await;

    assert!(unstaged.is_empty());
    assert!(staged.is_empty());
}

#[tokio::test]
async fn test_unparseable_diff_lists_changed_files() {
    let fx = fixture(CannedRunner::default().respond("diff", "Binary blob without headers\n"));

    let report = fx.analyzer.analyze(&ChangeRequest::new(&fx.repo)).await;

    let ChangeReport::NoChanges { message, .. } = report else {
        panic!("expected no_changes");
    };
    assert_eq!(message, "No parseable changes detected in the git diff");
}

#[tokio::test]
async fn test_min_code_change_is_configurable() {
    let dir = TempDir::new().unwrap();
    let repo_dir = dir.path().join("work");
    Repository::init(&repo_dir).unwrap();
    let runner = Arc::new(CannedRunner::default().respond("diff --cached", STAGED));
    let cache = RepositoryCache::new(CacheConfig::new(dir.path().join("cache")), runner);
    let analyzer = ChangeAnalyzer::new(Arc::new(cache)).with_min_code_change_bytes(1);

    let report = analyzer
        .analyze(&ChangeRequest::new(repo_dir.to_string_lossy()))
        .await;

    let ChangeReport::Success { results, .. } = report else {
        panic!("expected success");
    };
    assert!(results.contains_key("tiny.txt"));
}

#[tokio::test]
async fn test_missing_local_path_gets_guidance() {
    let fx = fixture(CannedRunner::default());

    let report = fx
        .analyzer
        .analyze(&ChangeRequest::new("/home/runner/_work/repo/repo"))
        .await;

    let ChangeReport::Error { message } = report else {
        panic!("expected error");
    };
    assert!(message.starts_with("Could not access or clone repository: /home/runner/_work/repo/repo"));
    assert!(message.contains("owner/repo@branch-name"));
    assert!(fx.runner.calls().is_empty());
}

#[tokio::test]
async fn test_blank_workspace_is_an_error() {
    let fx = fixture(CannedRunner::default());

    let report = fx.analyzer.analyze(&ChangeRequest::new("  ")).await;

    let ChangeReport::Error { message } = report else {
        panic!("expected error");
    };
    assert_eq!(message, "workspace parameter is required");
}

#[tokio::test]
async fn test_directory_without_git_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("plain")).unwrap();
    let fx = fixture(CannedRunner::default());

    let report = fx
        .analyzer
        .analyze(&ChangeRequest::new(dir.path().join("plain").to_string_lossy()))
        .await;

    assert!(matches!(report, ChangeReport::Error { .. }));
    assert_eq!(report.exit_code(), 1);
}

mod display;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wfcheck_core::fetch::{ContentFetcher, GraphqlContentFetcher, ProjectFiles, RestContentFetcher};
use wfcheck_core::{AnalyzeError, Analyzer};

#[derive(Parser)]
#[command(
    name = "wfcheck",
    version,
    about = "wfcheck — validate GitHub Actions workflows and the references between them",
    long_about = "Validates each workflow against the GitHub Actions schema, then resolves every `uses:` reference (local workflows, remote workflows, actions) and checks that required inputs are supplied with compatible values."
)]
struct Cli {
    /// Project directory containing .github/workflows, or a single workflow file
    path: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{err:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<bool> {
    let (root, workflows) = locate_workflows(&cli.path)?;
    if workflows.is_empty() {
        bail!(
            "no workflow files found in {}",
            root.join(".github/workflows").display()
        );
    }

    let analyzer = Analyzer::new(Arc::new(ProjectFiles::new(&root)), content_fetcher()?);

    let mut reports: Vec<(String, Result<(), AnalyzeError>)> = Vec::new();
    for name in &workflows {
        let path = format!(".github/workflows/{name}");
        reports.push((name.clone(), analyzer.analyze(&path).await));
    }
    let all_valid = reports.iter().all(|(_, result)| result.is_ok());

    if cli.format == "json" {
        display::print_json(&reports)?;
    } else {
        for (name, result) in &reports {
            match result {
                Ok(()) => display::print_valid(name),
                Err(err) => display::print_failure(name, err),
            }
        }
    }

    Ok(all_valid)
}

/// Resolve the positional argument into a project root and the workflow
/// file names to validate, lexicographically ordered.
fn locate_workflows(path: &Path) -> Result<(PathBuf, Vec<String>)> {
    if path.is_dir() {
        let dir = path.join(".github").join("workflows");
        if !dir.is_dir() {
            bail!(
                "'{}' does not contain a .github/workflows directory",
                path.display()
            );
        }
        let mut names = Vec::new();
        for extension in ["yml", "yaml"] {
            let pattern = dir.join(format!("*.{extension}")).to_string_lossy().to_string();
            for entry in glob::glob(&pattern).context("failed to read glob pattern")? {
                let entry = entry?;
                if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        return Ok((path.to_path_buf(), names));
    }

    if path.is_file() {
        let parent = path.parent().filter(|p| p.file_name().is_some_and(|n| n == "workflows"));
        let github = parent.and_then(Path::parent).filter(|p| p.file_name().is_some_and(|n| n == ".github"));
        let Some(github) = github else {
            bail!(
                "workflow file '{}' must be inside a .github/workflows/ directory",
                path.display()
            );
        };
        let root = github.parent().unwrap_or(Path::new(".")).to_path_buf();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("workflow file has no usable name")?;
        return Ok((root, vec![name]));
    }

    bail!("path '{}' does not exist", path.display());
}

/// Pick the repository fetcher: REST by default, GraphQL when
/// WFCHECK_GRAPHQL=1 and a token is present.
fn content_fetcher() -> Result<Arc<dyn ContentFetcher>> {
    let token = std::env::var("GITHUB_TOKEN").ok();
    let use_graphql = std::env::var("WFCHECK_GRAPHQL").map(|v| v == "1").unwrap_or(false);

    if use_graphql {
        let Some(token) = token else {
            bail!("WFCHECK_GRAPHQL=1 requires GITHUB_TOKEN to be set");
        };
        let fetcher =
            GraphqlContentFetcher::new(token).context("failed to create GraphQL client")?;
        return Ok(Arc::new(fetcher));
    }

    let fetcher = RestContentFetcher::new(token).context("failed to create HTTP client")?;
    Ok(Arc::new(fetcher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const VALID_WORKFLOW: &str =
        "on: [push]\njobs:\n  build:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n";

    fn project(files: &[&str]) -> TempDir {
        project_with(&files.iter().map(|n| (*n, VALID_WORKFLOW)).collect::<Vec<_>>())
    }

    fn project_with(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let workflows = tmp.path().join(".github/workflows");
        fs::create_dir_all(&workflows).unwrap();
        for (name, content) in files {
            fs::write(workflows.join(name), content).unwrap();
        }
        tmp
    }

    fn cli_for(tmp: &TempDir, format: &str) -> Cli {
        Cli {
            path: tmp.path().to_path_buf(),
            format: format.to_string(),
        }
    }

    #[test]
    fn test_directory_mode_sorts_lexicographically() {
        let tmp = project(&["deploy.yaml", "ci.yml", "audit.yml"]);
        let (root, names) = locate_workflows(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());
        assert_eq!(names, vec!["audit.yml", "ci.yml", "deploy.yaml"]);
    }

    #[test]
    fn test_directory_mode_requires_workflows_dir() {
        let tmp = TempDir::new().unwrap();
        let err = locate_workflows(tmp.path()).unwrap_err();
        assert!(err.to_string().contains(".github/workflows"));
    }

    #[test]
    fn test_file_mode_resolves_project_root() {
        let tmp = project(&["ci.yml"]);
        let file = tmp.path().join(".github/workflows/ci.yml");
        let (root, names) = locate_workflows(&file).unwrap();
        assert_eq!(root, tmp.path());
        assert_eq!(names, vec!["ci.yml"]);
    }

    #[test]
    fn test_file_mode_rejects_stray_files() {
        let tmp = TempDir::new().unwrap();
        let stray = tmp.path().join("ci.yml");
        fs::write(&stray, "on: [push]").unwrap();
        let err = locate_workflows(&stray).unwrap_err();
        assert!(err.to_string().contains(".github/workflows/"));
    }

    #[test]
    fn test_missing_path() {
        let err = locate_workflows(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_run_passes_valid_project() {
        let tmp = project(&["ci.yml", "deploy.yml"]);
        assert!(run(&cli_for(&tmp, "text")).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_flags_invalid_workflow() {
        let tmp = project_with(&[
            ("ci.yml", VALID_WORKFLOW),
            ("broken.yml", "on: [push]\njobs: {}\n"),
        ]);
        assert!(!run(&cli_for(&tmp, "text")).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_resolves_local_workflow_calls() {
        let tmp = project_with(&[
            (
                "release.yml",
                "on: { workflow_dispatch: }\njobs: { verify: { uses: ./.github/workflows/verify.yml } }\n",
            ),
            (
                "verify.yml",
                "on: { workflow_call: }\njobs:\n  verify:\n    runs-on: ubuntu-latest\n    steps:\n      - run: make\n",
            ),
        ]);
        assert!(run(&cli_for(&tmp, "json")).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_fails_on_empty_workflows_dir() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".github/workflows")).unwrap();
        let err = run(&cli_for(&tmp, "text")).await.unwrap_err();
        assert!(err.to_string().contains("no workflow files found"));
    }
}

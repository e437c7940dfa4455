//! Persistence collaborator: write the engine's output to storage and
//! record it in version control when one is available.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Where the result landed and whether it was committed to git.
#[derive(Debug)]
pub struct SaveReport {
    pub path: PathBuf,
    pub committed: bool,
}

/// Pick where results land: the repository itself when it is a directory,
/// its parent when it is a file, the working directory otherwise (URLs).
pub fn resolve_target_dir(repository: &str) -> PathBuf {
    let path = Path::new(repository);
    if path.is_dir() {
        path.to_path_buf()
    } else if path.is_file() {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        PathBuf::from(".")
    }
}

/// Write `output` to `dependency_tree_<package>_<timestamp>.txt` in
/// `target_dir`, then commit it if the directory is inside a git work tree.
/// When the commit cannot happen, a note line with the failure reason goes
/// to `.commit.txt` instead.
pub fn save_result(output: &str, target_dir: &Path, package: &str) -> Result<SaveReport> {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    let filename = format!("dependency_tree_{package}_{timestamp}.txt");
    let out_path = target_dir.join(&filename);
    std::fs::write(&out_path, output)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    match commit_result(target_dir, &out_path, package, &timestamp) {
        Ok(()) => Ok(SaveReport {
            path: out_path,
            committed: true,
        }),
        Err(err) => {
            tracing::warn!("commit failed, noting in log instead: {err:#}");
            note_in_log(target_dir, &filename, &timestamp, &err)?;
            Ok(SaveReport {
                path: out_path,
                committed: false,
            })
        }
    }
}

fn commit_result(target_dir: &Path, out_path: &Path, package: &str, timestamp: &str) -> Result<()> {
    let repo = git2::Repository::discover(target_dir).context("not inside a git work tree")?;
    let workdir = repo
        .workdir()
        .context("bare repository has no work tree")?
        .canonicalize()?;
    let abs = out_path.canonicalize()?;
    let rel = abs
        .strip_prefix(&workdir)
        .context("result file is outside the work tree")?;

    let mut index = repo.index()?;
    index.add_path(rel)?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let signature = repo
        .signature()
        .or_else(|_| git2::Signature::now("depscope", "depscope@localhost"))?;
    let message = format!("Add dependency tree for {package} at {timestamp}");
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    match parent {
        Some(parent) => {
            repo.commit(Some("HEAD"), &signature, &signature, &message, &tree, &[&parent])?
        }
        None => repo.commit(Some("HEAD"), &signature, &signature, &message, &tree, &[])?,
    };
    Ok(())
}

fn note_in_log(
    target_dir: &Path,
    filename: &str,
    timestamp: &str,
    reason: &anyhow::Error,
) -> Result<()> {
    use std::io::Write;
    let note = target_dir.join(".commit.txt");
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&note)
        .with_context(|| format!("failed to open {}", note.display()))?;
    writeln!(file, "{timestamp} - created {filename} (git error: {reason:#})")?;
    Ok(())
}

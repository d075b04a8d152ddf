//! Brings a local clone in line with a remote branch.
//!
//! A missing local path is cloned. An existing one is pulled, the local
//! `origin/<branch>` branch is force-recreated from the remote-tracking ref
//! and checked out, then pulled again so it ends on the remote tip.
//! Any failure removes the local path before the error is returned.

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{AnnotatedCommit, Commit, Repository, Signature};

use crate::error::{AppError, Result};
use crate::git::credentials;
use crate::models::{Credentials, LocalRepositoryHandle, RepositoryDescriptor, REMOTE_NAME};
use crate::storage;

pub fn reconcile(descriptor: &RepositoryDescriptor) -> Result<LocalRepositoryHandle> {
    tracing::info!(
        repo = %descriptor,
        path = %descriptor.local_path.display(),
        branch = %descriptor.branch,
        kind = ?descriptor.kind,
        "Reconciling repository"
    );

    match sync(descriptor) {
        Ok(handle) => {
            tracing::info!(repo = %descriptor, head = %handle.head, "Completed reconciling repository");
            Ok(handle)
        }
        Err(e) => {
            tracing::error!(repo = %descriptor, error = %e, "Failed to reconcile repository");
            storage::remove_dir_best_effort(&descriptor.local_path);
            Err(AppError::reconciliation(descriptor.local_path.clone(), e))
        }
    }
}

fn sync(descriptor: &RepositoryDescriptor) -> Result<LocalRepositoryHandle> {
    let credentials = descriptor.credentials.as_ref();

    let repo = if create_repo_dir(&descriptor.local_path)? {
        tracing::info!(path = %descriptor.local_path.display(), "Clone repository");
        let mut builder = RepoBuilder::new();
        builder.fetch_options(credentials::fetch_options(credentials));
        let repo = builder.clone(&descriptor.url, &descriptor.local_path)?;
        track_remote_branch(&repo, descriptor, false)?;
        repo
    } else {
        tracing::info!(path = %descriptor.local_path.display(), "Pull repository");
        let repo = Repository::open(&descriptor.local_path)?;
        pull(&repo, credentials)?;
        track_remote_branch(&repo, descriptor, true)?;
        pull(&repo, credentials)?;
        repo
    };

    let head = repo.head()?.peel_to_commit()?.id().to_string();
    Ok(LocalRepositoryHandle {
        path: descriptor.local_path.clone(),
        branch: descriptor.tracking_branch(),
        head,
    })
}

/// Creates `path` when missing. Returns whether it had to be created.
fn create_repo_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        tracing::debug!(path = %path.display(), "Repository directory already exists");
        return Ok(false);
    }
    std::fs::create_dir_all(path)?;
    tracing::info!(path = %path.display(), "Created directory to keep repository");
    Ok(true)
}

/// Points local branch `origin/<branch>` at the remote-tracking ref, makes it
/// track the remote branch and checks it out.
///
/// Without `force` an existing branch of that name is an error.
fn track_remote_branch(repo: &Repository, descriptor: &RepositoryDescriptor, force: bool) -> Result<()> {
    let branch_name = descriptor.tracking_branch();
    let local_ref = format!("refs/heads/{}", branch_name);

    let target = repo.find_reference(&descriptor.remote_ref())?.peel_to_commit()?;

    // Check out before moving the ref so the old HEAD tree is the baseline.
    repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().force()))?;
    repo.reference(
        &local_ref,
        target.id(),
        force,
        &format!("branch: Created from {}", branch_name),
    )?;

    let mut config = repo.config()?;
    config.set_str(&format!("branch.{}.remote", branch_name), REMOTE_NAME)?;
    config.set_str(
        &format!("branch.{}.merge", branch_name),
        &format!("refs/heads/{}", descriptor.branch),
    )?;

    repo.set_head(&local_ref)?;
    tracing::debug!(branch = %branch_name, target = %target.id(), force, "Checked out tracking branch");
    Ok(())
}

/// Fetches from the remote and merges the upstream of the checked-out branch.
///
/// A detached HEAD or a branch without upstream is only fetched.
fn pull(repo: &Repository, credentials: Option<&Credentials>) -> Result<()> {
    let head = repo.head()?;

    let mut remote = repo.find_remote(REMOTE_NAME)?;
    let mut options = credentials::fetch_options(credentials);
    remote.fetch::<&str>(&[], Some(&mut options), None)?;

    if !head.is_branch() {
        tracing::debug!("HEAD is detached, nothing to merge");
        return Ok(());
    }

    let branch_ref = head
        .name()
        .ok_or_else(|| AppError::Internal("HEAD reference name is not valid UTF-8".to_string()))?
        .to_string();
    let branch_name = branch_ref.trim_start_matches("refs/heads/");

    let config = repo.config()?.snapshot()?;
    let merge_ref = match config.get_str(&format!("branch.{}.merge", branch_name)) {
        Ok(merge_ref) => merge_ref.to_string(),
        Err(_) => {
            tracing::debug!(branch = %branch_name, "Branch has no upstream, nothing to merge");
            return Ok(());
        }
    };
    let remote_name = config
        .get_str(&format!("branch.{}.remote", branch_name))
        .unwrap_or(REMOTE_NAME)
        .to_string();

    let upstream_ref = format!(
        "refs/remotes/{}/{}",
        remote_name,
        merge_ref.trim_start_matches("refs/heads/")
    );
    let upstream = repo.find_reference(&upstream_ref)?;
    let incoming = repo.reference_to_annotated_commit(&upstream)?;

    let (analysis, _) = repo.merge_analysis(&[&incoming])?;
    if analysis.is_up_to_date() {
        tracing::debug!(branch = %branch_name, "Already up to date");
        Ok(())
    } else if analysis.is_fast_forward() {
        let target = repo.find_commit(incoming.id())?;
        repo.checkout_tree(target.as_object(), Some(CheckoutBuilder::new().force()))?;
        repo.find_reference(&branch_ref)?
            .set_target(target.id(), &format!("pull: Fast-forward to {}", upstream_ref))?;
        tracing::debug!(branch = %branch_name, target = %target.id(), "Fast-forwarded");
        Ok(())
    } else {
        let local = head.peel_to_commit()?;
        merge(repo, &local, &incoming, &upstream_ref)
    }
}

fn merge(repo: &Repository, local: &Commit, incoming: &AnnotatedCommit, upstream_ref: &str) -> Result<()> {
    let remote = repo.find_commit(incoming.id())?;
    let mut index = repo.merge_commits(local, &remote, None)?;
    if index.has_conflicts() {
        return Err(AppError::Internal(format!(
            "merging {} into {} produced conflicts",
            upstream_ref,
            local.id()
        )));
    }

    let tree = repo.find_tree(index.write_tree_to(repo)?)?;
    repo.checkout_tree(tree.as_object(), Some(CheckoutBuilder::new().force()))?;

    let signature = repo
        .signature()
        .or_else(|_| Signature::now("repo-downloader", "repo-downloader@localhost"))?;
    let message = format!("Merge {} into {}", upstream_ref, local.id());
    let merged = repo.commit(Some("HEAD"), &signature, &signature, &message, &tree, &[local, &remote])?;

    tracing::info!(upstream = %upstream_ref, merged = %merged, "Merged diverged upstream");
    Ok(())
}

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{Commit, Oid, Repository, Signature, Time};
use repo_downloader::models::RepositoryDescriptor;

/// 2024-01-01T12:00:00Z
pub const DAY_ONE: i64 = 1_704_110_400;
pub const DAY: i64 = 86_400;

pub fn day(n: i64) -> i64 {
    DAY_ONE + (n - 1) * DAY
}

/// Bare repository whose HEAD points at `refs/heads/main`.
pub fn init_remote(path: &Path) -> Repository {
    let repo = Repository::init_bare(path).unwrap();
    repo.set_head("refs/heads/main").unwrap();
    repo
}

pub enum Change<'a> {
    Write(&'a str, &'a str),
    Remove(&'a str),
}

/// Commits `changes` on top of the first parent's tree and moves `update_ref`.
pub fn commit(
    repo: &Repository,
    update_ref: Option<&str>,
    parents: &[Oid],
    changes: &[Change],
    message: &str,
    time: i64,
) -> Oid {
    let parents: Vec<Commit> = parents.iter().map(|oid| repo.find_commit(*oid).unwrap()).collect();
    let base_tree = parents.first().map(|c| c.tree().unwrap());

    let mut builder = repo.treebuilder(base_tree.as_ref()).unwrap();
    for change in changes {
        match change {
            Change::Write(name, content) => {
                let blob = repo.blob(content.as_bytes()).unwrap();
                builder.insert(*name, blob, 0o100644).unwrap();
            }
            Change::Remove(name) => {
                builder.remove(*name).unwrap();
            }
        }
    }
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();

    let signature = Signature::new("Ada Lovelace", "ada@example.com", &Time::new(time, 60)).unwrap();
    let parent_refs: Vec<&Commit> = parents.iter().collect();
    repo.commit(update_ref, &signature, &signature, message, &tree, &parent_refs)
        .unwrap()
}

/// Commits on top of the current tip of `refname` (or as a root commit).
pub fn commit_on(repo: &Repository, refname: &str, changes: &[Change], message: &str, time: i64) -> Oid {
    let parents: Vec<Oid> = repo.refname_to_id(refname).ok().into_iter().collect();
    commit(repo, Some(refname), &parents, changes, message, time)
}

pub fn descriptor(url: &Path, branch: &str, local_path: PathBuf) -> RepositoryDescriptor {
    RepositoryDescriptor {
        id: "component-1".to_string(),
        url: url.to_str().unwrap().to_string(),
        branch: branch.to_string(),
        local_path,
        kind: None,
        credentials: None,
    }
}

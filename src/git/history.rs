//! Commit history walker.
//!
//! Walks the ancestry of HEAD oldest-first and yields one `CommitRecord`
//! per visited commit. Records are produced on demand; dropping the
//! iterator abandons the underlying revwalk.
//!
//! Date window policy: commits dated before `date_from` are skipped, the
//! first commit dated after `date_to` ends the walk. Dates are the
//! committer's calendar date in the committer's own offset.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use git2::build::CheckoutBuilder;
use git2::{Commit, Repository, Revwalk, Sort};

use crate::error::{AppError, Result};
use crate::git::diff;
use crate::models::CommitRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub checkout_each_revision: bool,
    pub diff_detail: bool,
}

pub struct HistoryWalker {
    repo: Repository,
    path: PathBuf,
}

impl HistoryWalker {
    /// Opens `<repo_path>/.git`, falling back to `repo_path` as a bare store.
    ///
    /// Returns `None` when neither holds a repository.
    pub fn open<P: AsRef<Path>>(repo_path: P) -> Option<Self> {
        let path = repo_path.as_ref();
        let git_dir = path.join(".git");

        let repo = if git_dir.exists() {
            Repository::open(&git_dir)
        } else if path.exists() {
            Repository::open_bare(path)
        } else {
            tracing::warn!(
                git_dir = %git_dir.display(),
                path = %path.display(),
                "Neither directory exists"
            );
            return None;
        };

        match repo {
            Ok(repo) => Some(Self {
                repo,
                path: path.to_path_buf(),
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "No repository found");
                None
            }
        }
    }

    /// Starts a walk over the ancestry of HEAD.
    ///
    /// A repository without commits yields an empty walk.
    pub fn commits(&self, options: WalkOptions) -> Result<CommitWalk<'_>> {
        tracing::info!(
            path = %self.path.display(),
            from = ?options.date_from,
            to = ?options.date_to,
            checkout = options.checkout_each_revision,
            "Getting commits of repository"
        );

        let head = match self.repo.head().and_then(|h| h.peel_to_commit()) {
            Ok(commit) => commit.id(),
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "No commits found");
                return Ok(CommitWalk::empty(&self.repo, &self.path, options));
            }
        };

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        revwalk.push(head)?;

        Ok(CommitWalk {
            repo: &self.repo,
            path: &self.path,
            revwalk: Some(revwalk),
            options,
            emitted: 0,
        })
    }
}

pub struct CommitWalk<'repo> {
    repo: &'repo Repository,
    path: &'repo Path,
    revwalk: Option<Revwalk<'repo>>,
    options: WalkOptions,
    emitted: usize,
}

impl<'repo> CommitWalk<'repo> {
    fn empty(repo: &'repo Repository, path: &'repo Path, options: WalkOptions) -> Self {
        Self {
            repo,
            path,
            revwalk: None,
            options,
            emitted: 0,
        }
    }

    fn finish(&mut self) {
        if self.revwalk.take().is_some() {
            tracing::info!(
                path = %self.path.display(),
                count = self.emitted,
                "Finished collecting commit statistics"
            );
        }
    }

    fn record(&self, commit: &Commit, committer_timestamp: DateTime<FixedOffset>) -> CommitRecord {
        let revision_id = commit.id().to_string();
        let author = commit.author();
        let committer = commit.committer();

        let mut record = CommitRecord {
            revision_id,
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_timestamp: to_datetime(author.when()),
            committer_name: committer.name().unwrap_or("").to_string(),
            committer_email: committer.email().unwrap_or("").to_string(),
            committer_timestamp,
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            files_changed: 0,
            insertions: 0,
            deletions: 0,
        };

        // Merge commits keep zeroed statistics.
        if commit.parent_count() <= 1 {
            match diff::commit_stats(self.repo, commit, self.options.diff_detail) {
                Ok(stats) => {
                    record.files_changed = stats.files_changed;
                    record.insertions = stats.insertions;
                    record.deletions = stats.deletions;
                }
                Err(source) => {
                    let err = AppError::Diff {
                        revision: record.revision_id.clone(),
                        source,
                    };
                    tracing::warn!(error = %err, "Failed to get commit diff");
                }
            }
        }

        record
    }
}

impl Iterator for CommitWalk<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let oid = match self.revwalk.as_mut()?.next() {
                Some(Ok(oid)) => oid,
                None => {
                    self.finish();
                    return None;
                }
                Some(Err(e)) => {
                    self.revwalk = None;
                    return Some(Err(e.into()));
                }
            };
            let commit = match self.repo.find_commit(oid) {
                Ok(commit) => commit,
                Err(e) => {
                    self.revwalk = None;
                    return Some(Err(e.into()));
                }
            };

            if self.options.checkout_each_revision {
                tracing::trace!(revision = %oid, "Making checkout");
                if let Err(source) = checkout_revision(self.repo, &commit) {
                    let err = AppError::Checkout {
                        revision: oid.to_string(),
                        source,
                    };
                    tracing::error!(error = %err, "Failed to checkout revision");
                }
            }

            let committer_timestamp = to_datetime(commit.committer().when());
            let commit_date = committer_timestamp.date_naive();

            if let Some(from) = self.options.date_from.filter(|from| commit_date < *from) {
                tracing::debug!(date = %commit_date, %from, "Ignore commit dated before window");
                continue;
            }
            if let Some(to) = self.options.date_to.filter(|to| commit_date > *to) {
                tracing::debug!(date = %commit_date, %to, "Do not check commits dated after window");
                self.finish();
                return None;
            }

            let record = self.record(&commit, committer_timestamp);
            self.emitted += 1;
            tracing::trace!(count = self.emitted, revision = %record.revision_id, "Collected commit info");
            return Some(Ok(record));
        }
    }
}

impl Drop for CommitWalk<'_> {
    fn drop(&mut self) {
        if self.revwalk.is_some() {
            tracing::debug!(
                path = %self.path.display(),
                count = self.emitted,
                "Commit walk abandoned by consumer"
            );
        }
    }
}

/// Writes every record of `walk` to `out` as one JSON object per line.
///
/// Records are written as they are produced. Returns the number written.
pub fn write_json_lines<W: Write>(walk: CommitWalk<'_>, mut out: W) -> Result<usize> {
    let mut written = 0;
    for record in walk {
        serde_json::to_writer(&mut out, &record?).map_err(std::io::Error::from)?;
        writeln!(out)?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

fn checkout_revision(repo: &Repository, commit: &Commit) -> std::result::Result<(), git2::Error> {
    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
    repo.set_head_detached(commit.id())
}

/// Instant of `time` expressed in the offset recorded with it.
pub fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

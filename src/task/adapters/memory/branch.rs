//! In-memory branch service for deterministic lifecycle tests.

use crate::task::{
    domain::{BranchName, CommitRef, TaskId},
    ports::{
        BranchOperation, BranchService, BranchServiceError, BranchServiceResult,
        WorkingCopyStatus,
    },
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory branch service.
///
/// Models a single working copy: a set of branches each pointing at a fake
/// commit, one checked-out branch, and a list of pending changes. Failures
/// can be injected per operation to exercise compensation paths.
#[derive(Debug, Clone)]
pub struct InMemoryBranchService {
    default_branch: BranchName,
    state: Arc<RwLock<InMemoryBranchState>>,
}

#[derive(Debug)]
struct InMemoryBranchState {
    branches: BTreeMap<BranchName, u64>,
    current: BranchName,
    pending_changes: Vec<String>,
    injected_failures: HashMap<BranchOperation, String>,
    next_commit: u64,
}

impl InMemoryBranchService {
    /// Creates a working copy with only the default branch `main`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_branch(BranchName::main())
    }

    /// Creates a working copy with only the given default branch.
    #[must_use]
    pub fn with_default_branch(default_branch: BranchName) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(default_branch.clone(), 1);
        let state = InMemoryBranchState {
            branches,
            current: default_branch.clone(),
            pending_changes: Vec::new(),
            injected_failures: HashMap::new(),
            next_commit: 2,
        };
        Self {
            default_branch,
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Checks out an existing branch, or creates it from the current branch.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn checkout(&self, branch: &BranchName) -> BranchServiceResult<()> {
        let mut state = self.write()?;
        let head = state.branches.get(&state.current).copied().unwrap_or(0);
        state.branches.entry(branch.clone()).or_insert(head);
        state.current = branch.clone();
        Ok(())
    }

    /// Records a commit on the checked-out branch.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn commit(&self) -> BranchServiceResult<CommitRef> {
        let mut state = self.write()?;
        let commit = state.next_commit;
        state.next_commit += 1;
        let current = state.current.clone();
        state.branches.insert(current, commit);
        state.pending_changes.clear();
        fake_commit_ref(commit)
    }

    /// Marks a path as changed but uncommitted.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn touch_path(&self, path: impl Into<String>) -> BranchServiceResult<()> {
        self.write()?.pending_changes.push(path.into());
        Ok(())
    }

    /// Makes every subsequent call of `operation` fail with `cause`.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn fail_on(
        &self,
        operation: BranchOperation,
        cause: impl Into<String>,
    ) -> BranchServiceResult<()> {
        self.write()?
            .injected_failures
            .insert(operation, cause.into());
        Ok(())
    }

    /// Removes an injected failure.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn clear_failure(&self, operation: BranchOperation) -> BranchServiceResult<()> {
        self.write()?.injected_failures.remove(&operation);
        Ok(())
    }

    /// Returns every branch name, sorted.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when lock acquisition fails.
    pub fn branches(&self) -> BranchServiceResult<Vec<BranchName>> {
        Ok(self.read()?.branches.keys().cloned().collect())
    }

    fn read(&self) -> BranchServiceResult<RwLockReadGuard<'_, InMemoryBranchState>> {
        self.state
            .read()
            .map_err(|err| BranchServiceError::runtime(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> BranchServiceResult<RwLockWriteGuard<'_, InMemoryBranchState>> {
        self.state
            .write()
            .map_err(|err| BranchServiceError::runtime(std::io::Error::other(err.to_string())))
    }
}

impl Default for InMemoryBranchService {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBranchState {
    fn check_injected(&self, operation: BranchOperation) -> BranchServiceResult<()> {
        if let Some(cause) = self.injected_failures.get(&operation) {
            return Err(BranchServiceError::Rejected {
                operation,
                cause: cause.clone(),
            });
        }
        Ok(())
    }
}

fn fake_commit_ref(commit: u64) -> BranchServiceResult<CommitRef> {
    CommitRef::new(format!("{commit:040x}"))
        .map_err(|err| BranchServiceError::InvalidOutput(err.to_string()))
}

#[async_trait]
impl BranchService for InMemoryBranchService {
    fn default_branch(&self) -> &BranchName {
        &self.default_branch
    }

    async fn create_branch(&self, task_id: TaskId) -> BranchServiceResult<BranchName> {
        let mut state = self.write()?;
        state.check_injected(BranchOperation::CreateBranch)?;

        let branch = BranchName::for_task(task_id);
        if state.branches.contains_key(&branch) {
            return Err(BranchServiceError::BranchExists(branch));
        }
        if !state.pending_changes.is_empty() {
            return Err(BranchServiceError::DirtyWorkingCopy {
                changed: state.pending_changes.len(),
            });
        }

        let base = state
            .branches
            .get(&self.default_branch)
            .copied()
            .ok_or_else(|| BranchServiceError::BranchNotFound(self.default_branch.clone()))?;
        state.branches.insert(branch.clone(), base);
        state.current = branch.clone();
        Ok(branch)
    }

    async fn current_branch(&self) -> BranchServiceResult<BranchName> {
        let state = self.read()?;
        state.check_injected(BranchOperation::CurrentBranch)?;
        Ok(state.current.clone())
    }

    async fn cleanup_branch(&self, branch: &BranchName) -> BranchServiceResult<()> {
        let mut state = self.write()?;
        state.check_injected(BranchOperation::CleanupBranch)?;

        state.current = self.default_branch.clone();
        if *branch == self.default_branch {
            return Err(BranchServiceError::Rejected {
                operation: BranchOperation::CleanupBranch,
                cause: String::from("refusing to delete the default branch"),
            });
        }
        if state.branches.remove(branch).is_none() {
            return Err(BranchServiceError::BranchNotFound(branch.clone()));
        }
        Ok(())
    }

    async fn complete_task(&self, task_id: TaskId) -> BranchServiceResult<()> {
        let mut state = self.write()?;
        let branch = BranchName::for_task(task_id);

        // The working copy ends on the default branch on every path.
        state.current = self.default_branch.clone();
        if let Some(cause) = state.injected_failures.get(&BranchOperation::CompleteTask) {
            return Err(BranchServiceError::MergeFailed {
                branch,
                cause: cause.clone(),
            });
        }
        let Some(task_head) = state.branches.get(&branch).copied() else {
            return Err(BranchServiceError::BranchNotFound(branch));
        };

        state.branches.insert(self.default_branch.clone(), task_head);
        state.branches.remove(&branch);
        Ok(())
    }

    async fn branch_exists(&self, branch: &BranchName) -> BranchServiceResult<bool> {
        let state = self.read()?;
        state.check_injected(BranchOperation::BranchExists)?;
        Ok(state.branches.contains_key(branch))
    }

    async fn status(&self) -> BranchServiceResult<WorkingCopyStatus> {
        let state = self.read()?;
        state.check_injected(BranchOperation::Status)?;
        Ok(WorkingCopyStatus {
            branch: state.current.clone(),
            changed_paths: state.pending_changes.clone(),
        })
    }

    async fn head_commit(&self) -> BranchServiceResult<Option<CommitRef>> {
        let state = self.read()?;
        state.check_injected(BranchOperation::HeadCommit)?;
        state
            .branches
            .get(&state.current)
            .copied()
            .map(fake_commit_ref)
            .transpose()
    }
}

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{GraphReader, GraphStore, GraphWriter};
use crate::core::{Account, EdgeKind, RelationEdge, Role, StorageError};

/// 进程内图存储
///
/// 单个写者锁串行化全部写事务；锁获取受限时返回 `WriteConflict`，
/// 调用方据此快速失败并自行决定是否重试。
#[derive(Debug)]
pub struct MemoryGraph {
    inner: RwLock<GraphData>,
    write_timeout: Duration,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
struct GraphData {
    accounts: HashMap<String, Account>,
    edges: Vec<RelationEdge>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::with_write_timeout_ms(5000)
    }

    pub fn with_write_timeout_ms(timeout_ms: u64) -> Self {
        Self {
            inner: RwLock::new(GraphData::default()),
            write_timeout: Duration::from_millis(timeout_ms),
        }
    }
}

impl GraphStore for MemoryGraph {
    fn begin_read(&self) -> Result<Box<dyn GraphReader + '_>, StorageError> {
        Ok(Box::new(MemoryReadTxn {
            guard: self.inner.read(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn GraphWriter + '_>, StorageError> {
        let guard = self.inner.try_write_for(self.write_timeout).ok_or_else(|| {
            StorageError::WriteConflict(format!(
                "{}ms 内未能获取写事务",
                self.write_timeout.as_millis()
            ))
        })?;
        // 整库快照，未提交的事务在 Drop 时用快照回滚
        let backup = GraphData::clone(&guard);
        Ok(Box::new(MemoryWriteTxn {
            guard,
            backup: Some(backup),
        }))
    }
}

struct MemoryReadTxn<'a> {
    guard: RwLockReadGuard<'a, GraphData>,
}

struct MemoryWriteTxn<'a> {
    guard: RwLockWriteGuard<'a, GraphData>,
    /// 提交时置 None；Drop 时仍持有快照则回滚
    backup: Option<GraphData>,
}

impl GraphData {
    fn get_account(&self, handle: &str) -> Option<Account> {
        self.accounts.get(handle).cloned()
    }

    fn scan_accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    fn count_role(&self, role: Role) -> usize {
        self.accounts.values().filter(|a| a.role == role).count()
    }

    fn scan_edges(&self, pred: impl Fn(&RelationEdge) -> bool) -> Vec<RelationEdge> {
        self.edges.iter().filter(|e| pred(e)).cloned().collect()
    }
}

impl GraphReader for MemoryReadTxn<'_> {
    fn account(&self, handle: &str) -> Result<Option<Account>, StorageError> {
        Ok(self.guard.get_account(handle))
    }

    fn accounts(&self) -> Result<Vec<Account>, StorageError> {
        Ok(self.guard.scan_accounts())
    }

    fn count_by_role(&self, role: Role) -> Result<usize, StorageError> {
        Ok(self.guard.count_role(role))
    }

    fn edges_from(&self, src: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        Ok(self.guard.scan_edges(|e| e.src == src && e.kind == kind))
    }

    fn edges_to(&self, dst: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        Ok(self.guard.scan_edges(|e| e.dst == dst && e.kind == kind))
    }

    fn edge_between(
        &self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<Option<RelationEdge>, StorageError> {
        Ok(self
            .guard
            .edges
            .iter()
            .find(|e| e.src == src && e.dst == dst && e.kind == kind)
            .cloned())
    }
}

impl GraphReader for MemoryWriteTxn<'_> {
    fn account(&self, handle: &str) -> Result<Option<Account>, StorageError> {
        Ok(self.guard.get_account(handle))
    }

    fn accounts(&self) -> Result<Vec<Account>, StorageError> {
        Ok(self.guard.scan_accounts())
    }

    fn count_by_role(&self, role: Role) -> Result<usize, StorageError> {
        Ok(self.guard.count_role(role))
    }

    fn edges_from(&self, src: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        Ok(self.guard.scan_edges(|e| e.src == src && e.kind == kind))
    }

    fn edges_to(&self, dst: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        Ok(self.guard.scan_edges(|e| e.dst == dst && e.kind == kind))
    }

    fn edge_between(
        &self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<Option<RelationEdge>, StorageError> {
        Ok(self
            .guard
            .edges
            .iter()
            .find(|e| e.src == src && e.dst == dst && e.kind == kind)
            .cloned())
    }
}

impl GraphWriter for MemoryWriteTxn<'_> {
    fn insert_account(&mut self, account: &Account) -> Result<(), StorageError> {
        if self.guard.accounts.contains_key(&account.handle) {
            return Err(StorageError::DuplicateKey(account.handle.clone()));
        }
        self.guard
            .accounts
            .insert(account.handle.clone(), account.clone());
        Ok(())
    }

    fn update_account(&mut self, account: &Account) -> Result<(), StorageError> {
        if !self.guard.accounts.contains_key(&account.handle) {
            return Err(StorageError::KeyNotFound(account.handle.clone()));
        }
        self.guard
            .accounts
            .insert(account.handle.clone(), account.clone());
        Ok(())
    }

    fn delete_account(&mut self, handle: &str) -> Result<(), StorageError> {
        if self.guard.accounts.remove(handle).is_none() {
            return Err(StorageError::KeyNotFound(handle.to_string()));
        }
        // 分离全部关联边
        self.guard.edges.retain(|e| !e.touches(handle));
        Ok(())
    }

    fn insert_edge(&mut self, edge: &RelationEdge) -> Result<(), StorageError> {
        self.guard.edges.push(edge.clone());
        Ok(())
    }

    fn delete_edge_between(
        &mut self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<bool, StorageError> {
        let before = self.guard.edges.len();
        self.guard
            .edges
            .retain(|e| !(e.src == src && e.dst == dst && e.kind == kind));
        Ok(self.guard.edges.len() < before)
    }

    fn delete_edges_to(&mut self, dst: &str, kind: EdgeKind) -> Result<usize, StorageError> {
        let before = self.guard.edges.len();
        self.guard.edges.retain(|e| !(e.dst == dst && e.kind == kind));
        Ok(before - self.guard.edges.len())
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        self.backup = None;
        Ok(())
    }
}

impl Drop for MemoryWriteTxn<'_> {
    fn drop(&mut self) {
        if let Some(backup) = self.backup.take() {
            *self.guard = backup;
        }
    }
}

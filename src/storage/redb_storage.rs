use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use super::{GraphReader, GraphStore, GraphWriter};
use crate::core::{Account, EdgeKind, RelationEdge, Role, StorageError};

const ACCOUNTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("accounts");
const EDGES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("edges");

/// redb 持久化图存储
///
/// redb 是单写者 B-tree 数据库，写事务天然串行化，
/// 事务隔离级别满足引擎对"单次一致读"的要求。
pub struct RedbGraph {
    db: Database,
}

impl RedbGraph {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::DbError(e.to_string()))?;
            }
        }

        let db = Database::create(path.as_ref())
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        // 首次打开时建表
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        {
            write_txn
                .open_table(ACCOUNTS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            write_txn
                .open_table(EDGES_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::DbError(e.to_string()))?;

        Ok(Self { db })
    }
}

impl std::fmt::Debug for RedbGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbGraph").finish()
    }
}

impl GraphStore for RedbGraph {
    fn begin_read(&self) -> Result<Box<dyn GraphReader + '_>, StorageError> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        Ok(Box::new(RedbReadTxn { txn }))
    }

    fn begin_write(&self) -> Result<Box<dyn GraphWriter + '_>, StorageError> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        Ok(Box::new(RedbWriteTxn { txn: Some(txn) }))
    }
}

struct RedbReadTxn {
    txn: redb::ReadTransaction,
}

struct RedbWriteTxn {
    /// 提交时取走；未提交即 Drop 时由 redb 自动中止
    txn: Option<redb::WriteTransaction>,
}

impl RedbWriteTxn {
    fn txn(&self) -> Result<&redb::WriteTransaction, StorageError> {
        self.txn
            .as_ref()
            .ok_or_else(|| StorageError::DbError("事务已提交".to_string()))
    }
}

fn decode_account(data: &[u8]) -> Result<Account, StorageError> {
    serde_json::from_slice(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_edge(data: &[u8]) -> Result<RelationEdge, StorageError> {
    serde_json::from_slice(data).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn get_account<T>(table: &T, handle: &str) -> Result<Option<Account>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    match table
        .get(handle)
        .map_err(|e| StorageError::DbError(e.to_string()))?
    {
        Some(guard) => decode_account(guard.value()).map(Some),
        None => Ok(None),
    }
}

fn collect_accounts<T>(table: &T) -> Result<Vec<Account>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut accounts = Vec::new();
    for item in table
        .iter()
        .map_err(|e| StorageError::DbError(e.to_string()))?
    {
        let (_, value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
        accounts.push(decode_account(value.value())?);
    }
    Ok(accounts)
}

fn collect_edges<T>(
    table: &T,
    pred: impl Fn(&RelationEdge) -> bool,
) -> Result<Vec<RelationEdge>, StorageError>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut edges = Vec::new();
    for item in table
        .iter()
        .map_err(|e| StorageError::DbError(e.to_string()))?
    {
        let (_, value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
        let edge = decode_edge(value.value())?;
        if pred(&edge) {
            edges.push(edge);
        }
    }
    Ok(edges)
}

impl GraphReader for RedbReadTxn {
    fn account(&self, handle: &str) -> Result<Option<Account>, StorageError> {
        let table = self
            .txn
            .open_table(ACCOUNTS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        get_account(&table, handle)
    }

    fn accounts(&self) -> Result<Vec<Account>, StorageError> {
        let table = self
            .txn
            .open_table(ACCOUNTS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        collect_accounts(&table)
    }

    fn count_by_role(&self, role: Role) -> Result<usize, StorageError> {
        Ok(self.accounts()?.iter().filter(|a| a.role == role).count())
    }

    fn edges_from(&self, src: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        let table = self
            .txn
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        collect_edges(&table, |e| e.src == src && e.kind == kind)
    }

    fn edges_to(&self, dst: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        let table = self
            .txn
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        collect_edges(&table, |e| e.dst == dst && e.kind == kind)
    }

    fn edge_between(
        &self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<Option<RelationEdge>, StorageError> {
        let table = self
            .txn
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let edges = collect_edges(&table, |e| e.src == src && e.dst == dst && e.kind == kind)?;
        Ok(edges.into_iter().next())
    }
}

impl GraphReader for RedbWriteTxn {
    fn account(&self, handle: &str) -> Result<Option<Account>, StorageError> {
        let table = self
            .txn()?
            .open_table(ACCOUNTS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        get_account(&table, handle)
    }

    fn accounts(&self) -> Result<Vec<Account>, StorageError> {
        let table = self
            .txn()?
            .open_table(ACCOUNTS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        collect_accounts(&table)
    }

    fn count_by_role(&self, role: Role) -> Result<usize, StorageError> {
        Ok(self.accounts()?.iter().filter(|a| a.role == role).count())
    }

    fn edges_from(&self, src: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        let table = self
            .txn()?
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        collect_edges(&table, |e| e.src == src && e.kind == kind)
    }

    fn edges_to(&self, dst: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError> {
        let table = self
            .txn()?
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        collect_edges(&table, |e| e.dst == dst && e.kind == kind)
    }

    fn edge_between(
        &self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<Option<RelationEdge>, StorageError> {
        let table = self
            .txn()?
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let edges = collect_edges(&table, |e| e.src == src && e.dst == dst && e.kind == kind)?;
        Ok(edges.into_iter().next())
    }
}

impl RedbWriteTxn {
    fn remove_edges_where(
        &mut self,
        pred: impl Fn(&RelationEdge) -> bool,
    ) -> Result<usize, StorageError> {
        let txn = self.txn()?;
        let mut table = txn
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let doomed: Vec<String> = {
            let mut keys = Vec::new();
            for item in table
                .iter()
                .map_err(|e| StorageError::DbError(e.to_string()))?
            {
                let (key, value) = item.map_err(|e| StorageError::DbError(e.to_string()))?;
                if pred(&decode_edge(value.value())?) {
                    keys.push(key.value().to_string());
                }
            }
            keys
        };
        for key in &doomed {
            table
                .remove(key.as_str())
                .map_err(|e| StorageError::DbError(e.to_string()))?;
        }
        Ok(doomed.len())
    }
}

impl GraphWriter for RedbWriteTxn {
    fn insert_account(&mut self, account: &Account) -> Result<(), StorageError> {
        let data =
            serde_json::to_vec(account).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let txn = self.txn()?;
        let mut table = txn
            .open_table(ACCOUNTS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let exists = table
            .get(account.handle.as_str())
            .map_err(|e| StorageError::DbError(e.to_string()))?
            .is_some();
        if exists {
            return Err(StorageError::DuplicateKey(account.handle.clone()));
        }
        table
            .insert(account.handle.as_str(), data.as_slice())
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        Ok(())
    }

    fn update_account(&mut self, account: &Account) -> Result<(), StorageError> {
        let data =
            serde_json::to_vec(account).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let txn = self.txn()?;
        let mut table = txn
            .open_table(ACCOUNTS_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        let exists = table
            .get(account.handle.as_str())
            .map_err(|e| StorageError::DbError(e.to_string()))?
            .is_some();
        if !exists {
            return Err(StorageError::KeyNotFound(account.handle.clone()));
        }
        table
            .insert(account.handle.as_str(), data.as_slice())
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        Ok(())
    }

    fn delete_account(&mut self, handle: &str) -> Result<(), StorageError> {
        {
            let txn = self.txn()?;
            let mut table = txn
                .open_table(ACCOUNTS_TABLE)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            let removed = table
                .remove(handle)
                .map_err(|e| StorageError::DbError(e.to_string()))?;
            if removed.is_none() {
                return Err(StorageError::KeyNotFound(handle.to_string()));
            }
        }
        // 分离全部关联边
        self.remove_edges_where(|e| e.touches(handle))?;
        Ok(())
    }

    fn insert_edge(&mut self, edge: &RelationEdge) -> Result<(), StorageError> {
        let data =
            serde_json::to_vec(edge).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let key = edge.id.to_string();
        let txn = self.txn()?;
        let mut table = txn
            .open_table(EDGES_TABLE)
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        table
            .insert(key.as_str(), data.as_slice())
            .map_err(|e| StorageError::DbError(e.to_string()))?;
        Ok(())
    }

    fn delete_edge_between(
        &mut self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<bool, StorageError> {
        let removed =
            self.remove_edges_where(|e| e.src == src && e.dst == dst && e.kind == kind)?;
        Ok(removed > 0)
    }

    fn delete_edges_to(&mut self, dst: &str, kind: EdgeKind) -> Result<usize, StorageError> {
        self.remove_edges_where(|e| e.dst == dst && e.kind == kind)
    }

    fn commit(mut self: Box<Self>) -> Result<(), StorageError> {
        let txn = self
            .txn
            .take()
            .ok_or_else(|| StorageError::DbError("事务已提交".to_string()))?;
        txn.commit()
            .map_err(|e| StorageError::DbError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Role;

    fn open_temp() -> (tempfile::TempDir, RedbGraph) {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let store = RedbGraph::open(dir.path().join("test.redb")).expect("打开存储失败");
        (dir, store)
    }

    #[test]
    fn test_account_roundtrip_survives_reopen() {
        let dir = tempfile::tempdir().expect("创建临时目录失败");
        let path = dir.path().join("test.redb");
        {
            let store = RedbGraph::open(&path).expect("打开存储失败");
            let mut txn = store.begin_write().expect("开启写事务失败");
            txn.insert_account(&Account::new("alice", "hash".to_string(), Role::Admin))
                .expect("插入失败");
            txn.commit().expect("提交失败");
        }

        let store = RedbGraph::open(&path).expect("重新打开失败");
        let txn = store.begin_read().expect("开启读事务失败");
        let alice = txn.account("alice").expect("点查失败").expect("应已持久化");
        assert_eq!(alice.role, Role::Admin);
    }

    #[test]
    fn test_uncommitted_write_aborts() {
        let (_dir, store) = open_temp();
        {
            let mut txn = store.begin_write().expect("开启写事务失败");
            txn.insert_account(&Account::new("alice", "hash".to_string(), Role::Member))
                .expect("插入失败");
            // 不提交
        }
        let txn = store.begin_read().expect("开启读事务失败");
        assert!(txn.account("alice").expect("点查失败").is_none());
    }

    #[test]
    fn test_edge_scans_and_detach() {
        let (_dir, store) = open_temp();
        let mut txn = store.begin_write().expect("开启写事务失败");
        txn.insert_account(&Account::new("alice", "hash".to_string(), Role::Admin))
            .expect("插入失败");
        txn.insert_account(&Account::new("bob", "hash".to_string(), Role::Member))
            .expect("插入失败");
        txn.insert_edge(&RelationEdge::new("alice", "bob", EdgeKind::Created))
            .expect("插边失败");
        txn.insert_edge(&RelationEdge::new("alice", "bob", EdgeKind::Promoted))
            .expect("插边失败");

        assert_eq!(
            txn.edges_to("bob", EdgeKind::Created).expect("扫边失败").len(),
            1
        );
        assert!(txn
            .edge_between("alice", "bob", EdgeKind::Promoted)
            .expect("查边失败")
            .is_some());

        txn.delete_account("bob").expect("删除失败");
        assert!(txn
            .edges_to("bob", EdgeKind::Promoted)
            .expect("扫边失败")
            .is_empty());
        txn.commit().expect("提交失败");
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let (_dir, store) = open_temp();
        let mut txn = store.begin_write().expect("开启写事务失败");
        let account = Account::new("alice", "hash".to_string(), Role::Member);
        txn.insert_account(&account).expect("插入失败");
        let err = txn.insert_account(&account).unwrap_err();
        assert_eq!(err, StorageError::DuplicateKey("alice".to_string()));
    }
}

use crate::core::{Account, EdgeKind, RelationEdge, Role, StorageError};

/// Read-side operations available inside any transaction.
pub trait GraphReader {
    /// 按 handle 点查账号节点
    fn account(&self, handle: &str) -> Result<Option<Account>, StorageError>;

    /// 全表扫描所有账号节点
    fn accounts(&self) -> Result<Vec<Account>, StorageError>;

    /// 按角色统计账号数量
    fn count_by_role(&self, role: Role) -> Result<usize, StorageError>;

    /// 按源端点和边类型扫描出边
    fn edges_from(&self, src: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError>;

    /// 按目标端点和边类型扫描入边
    fn edges_to(&self, dst: &str, kind: EdgeKind) -> Result<Vec<RelationEdge>, StorageError>;

    /// 查找指定端点对之间的某类边
    fn edge_between(
        &self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<Option<RelationEdge>, StorageError>;
}

/// Write transaction: reads observe the transaction's own pending writes.
/// 未提交即丢弃的事务不留下任何痕迹。
pub trait GraphWriter: GraphReader {
    /// 插入账号节点。handle 唯一性由存储层保证，冲突返回 `DuplicateKey`。
    fn insert_account(&mut self, account: &Account) -> Result<(), StorageError>;

    /// 覆写已存在的账号节点，节点缺失返回 `KeyNotFound`
    fn update_account(&mut self, account: &Account) -> Result<(), StorageError>;

    /// 删除账号节点并分离其全部关联边，节点缺失返回 `KeyNotFound`
    fn delete_account(&mut self, handle: &str) -> Result<(), StorageError>;

    /// 追加一条边记录
    fn insert_edge(&mut self, edge: &RelationEdge) -> Result<(), StorageError>;

    /// 删除指定端点对之间的某类边，返回是否删除了记录
    fn delete_edge_between(
        &mut self,
        src: &str,
        dst: &str,
        kind: EdgeKind,
    ) -> Result<bool, StorageError>;

    /// 删除指向目标的某类全部边，返回删除数量
    fn delete_edges_to(&mut self, dst: &str, kind: EdgeKind) -> Result<usize, StorageError>;

    /// 提交事务
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
}

/// Transactional graph store backing the engine.
///
/// 实现方约定：写事务彼此串行化（单写者），`begin_write` 在写者被占用时
/// 要么阻塞要么在限时后返回 `WriteConflict`，由实现决定。
pub trait GraphStore: Send + Sync {
    fn begin_read(&self) -> Result<Box<dyn GraphReader + '_>, StorageError>;
    fn begin_write(&self) -> Result<Box<dyn GraphWriter + '_>, StorageError>;
}

//! 审计日志存储层
//!
//! Append-only 设计，没有任何删除/更新接口。
//! SHA256 哈希链确保防篡改。与业务数据共用同一个 redb 数据库文件，
//! 但 append 自成事务 —— 审计写入不在业务事务的原子范围内。

use redb::{Database, ReadableDatabase, ReadableTable};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;

use super::types::{AuditAction, AuditChainVerification, AuditEntry, AuditQuery};
use crate::storage::AUDIT_LOG;

/// 存储错误
#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

/// 审计日志存储 (redb)
///
/// Append-only：仅提供 `append` 和查询方法，没有 delete/update 接口。
#[derive(Clone)]
pub struct AuditStorage {
    db: Arc<Database>,
}

impl AuditStorage {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// 追加一条审计日志
    ///
    /// 1. 读取当前最大序列号和 last_hash
    /// 2. 计算新条目的哈希
    /// 3. 写入条目并提交
    ///
    /// redb 单写者保证 read-modify-write 不会竞争。
    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &self,
        action: AuditAction,
        clinic_id: String,
        resource_type: String,
        resource_id: String,
        operator_id: Option<String>,
        operator_email: Option<String>,
        details: serde_json::Value,
    ) -> AuditStorageResult<AuditEntry> {
        let txn = self.db.begin_write()?;
        let entry = {
            let mut table = txn.open_table(AUDIT_LOG)?;

            let (sequence, prev_hash) = match table.last()? {
                Some((_key, value)) => {
                    let last: AuditEntry = serde_json::from_slice(value.value())?;
                    (last.id + 1, last.curr_hash)
                }
                None => (1, "genesis".to_string()),
            };

            let timestamp = shared::util::now_millis();
            let curr_hash = compute_audit_hash(
                &prev_hash,
                sequence,
                timestamp,
                &action,
                &clinic_id,
                &resource_type,
                &resource_id,
                operator_id.as_deref(),
                operator_email.as_deref(),
                &details,
            );

            let entry = AuditEntry {
                id: sequence,
                timestamp,
                action,
                clinic_id,
                resource_type,
                resource_id,
                operator_id,
                operator_email,
                details,
                prev_hash,
                curr_hash,
            };
            let value = serde_json::to_vec(&entry)?;
            table.insert(sequence, value.as_slice())?;
            entry
        };
        txn.commit()?;
        Ok(entry)
    }

    /// 查询审计日志（按序列号倒序，最新在前）
    pub fn query(&self, q: &AuditQuery) -> AuditStorageResult<Vec<AuditEntry>> {
        let limit = q.limit.unwrap_or(100);
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOG)?;

        let mut entries = Vec::new();
        for result in table.iter()?.rev() {
            if entries.len() >= limit {
                break;
            }
            let (_key, value) = result?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;
            if let Some(clinic_id) = &q.clinic_id
                && &entry.clinic_id != clinic_id
            {
                continue;
            }
            if let Some(action) = q.action
                && entry.action != action
            {
                continue;
            }
            if let Some(resource_type) = &q.resource_type
                && &entry.resource_type != resource_type
            {
                continue;
            }
            if let Some(from) = q.from
                && entry.timestamp < from
            {
                continue;
            }
            if let Some(to) = q.to
                && entry.timestamp > to
            {
                continue;
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    /// 验证审计链完整性：从头重算每条哈希并核对链接
    pub fn verify_chain(&self) -> AuditStorageResult<AuditChainVerification> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(AUDIT_LOG)?;

        let mut expected_prev = "genesis".to_string();
        let mut checked: u64 = 0;
        for result in table.iter()? {
            let (_key, value) = result?;
            let entry: AuditEntry = serde_json::from_slice(value.value())?;

            let recomputed = compute_audit_hash(
                &entry.prev_hash,
                entry.id,
                entry.timestamp,
                &entry.action,
                &entry.clinic_id,
                &entry.resource_type,
                &entry.resource_id,
                entry.operator_id.as_deref(),
                entry.operator_email.as_deref(),
                &entry.details,
            );
            if entry.prev_hash != expected_prev || entry.curr_hash != recomputed {
                return Ok(AuditChainVerification {
                    valid: false,
                    entries_checked: checked,
                    first_broken: Some(entry.id),
                });
            }
            expected_prev = entry.curr_hash;
            checked += 1;
        }

        Ok(AuditChainVerification {
            valid: true,
            entries_checked: checked,
            first_broken: None,
        })
    }
}

/// 计算条目哈希
///
/// - 变长字段用 `\x00` 分隔，避免字段拼接歧义
/// - Optional 字段用 tag byte 区分 None 与 Some("")
/// - action 使用 serde 序列化（snake_case，跨版本稳定），而非 Debug
#[allow(clippy::too_many_arguments)]
fn compute_audit_hash(
    prev_hash: &str,
    id: u64,
    timestamp: i64,
    action: &AuditAction,
    clinic_id: &str,
    resource_type: &str,
    resource_id: &str,
    operator_id: Option<&str>,
    operator_email: Option<&str>,
    details: &serde_json::Value,
) -> String {
    let mut hasher = Sha256::new();

    // 链接前一条哈希
    hasher.update(prev_hash.as_bytes());
    hasher.update(b"\x00");

    // 定长字段
    hasher.update(id.to_le_bytes());
    hasher.update(timestamp.to_le_bytes());

    // action — serde snake_case
    let action_str = serde_json::to_string(action).unwrap_or_default();
    hasher.update(action_str.as_bytes());
    hasher.update(b"\x00");

    // 变长字符串字段 — 分隔符隔离
    hasher.update(clinic_id.as_bytes());
    hasher.update(b"\x00");
    hasher.update(resource_type.as_bytes());
    hasher.update(b"\x00");
    hasher.update(resource_id.as_bytes());
    hasher.update(b"\x00");

    // Optional 字段 — tag byte 区分 None/Some
    hash_optional(&mut hasher, operator_id);
    hash_optional(&mut hasher, operator_email);

    // details JSON — 我们自己序列化、自己存储，字节稳定
    let details_json = serde_json::to_string(details).unwrap_or_default();
    hasher.update(details_json.as_bytes());
    hasher.update(b"\x00");

    format!("{:x}", hasher.finalize())
}

/// Optional 字段哈希：`\x00` = None, `\x01` + bytes + `\x00` = Some
fn hash_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(v) => {
            hasher.update(b"\x01");
            hasher.update(v.as_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    hasher.update(b"\x00");
}

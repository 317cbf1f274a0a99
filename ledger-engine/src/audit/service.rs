//! 审计日志服务
//!
//! `AuditService` 持有写入通道和存储句柄：
//! - 写入：引擎在业务事务提交后把 `AuditLogRequest` 投递到通道，
//!   后台 [`super::AuditWorker`] 消费并落盘
//! - 查询 / 链验证：直接读取存储

use tokio::sync::mpsc;

use super::storage::{AuditStorage, AuditStorageResult};
use super::types::{AuditAction, AuditChainVerification, AuditEntry, AuditQuery};

/// 发送到审计 worker 的日志请求
#[derive(Debug)]
pub struct AuditLogRequest {
    pub clinic_id: String,
    pub action: AuditAction,
    pub resource_type: String,
    pub resource_id: String,
    pub operator_id: Option<String>,
    pub operator_email: Option<String>,
    pub details: serde_json::Value,
}

/// 审计日志服务
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl AuditService {
    /// 创建审计服务；返回的 Receiver 交给 [`super::AuditWorker::run`]
    pub fn new(
        storage: AuditStorage,
        buffer_size: usize,
    ) -> (Self, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self { storage, tx }, rx)
    }

    /// 引擎持有的发送端
    pub fn sender(&self) -> mpsc::Sender<AuditLogRequest> {
        self.tx.clone()
    }

    /// 存储句柄（worker 构造用）
    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }

    /// 查询审计日志
    pub fn query(&self, q: &AuditQuery) -> AuditStorageResult<Vec<AuditEntry>> {
        self.storage.query(q)
    }

    /// 验证审计链完整性
    pub fn verify_chain(&self) -> AuditStorageResult<AuditChainVerification> {
        self.storage.verify_chain()
    }
}

//! Clinic Ledger Engine
//!
//! Transactional core of the clinic management system: document-number
//! issuance, FEFO stock allocation and reversal, invoice/payment posting
//! and the visit lifecycle, all executed as single atomic transactions
//! over an embedded redb database. UI, HTTP endpoints, authentication and
//! realtime fan-out live outside this crate and call into
//! [`LedgerEngine`].
//!
//! # 模块结构
//!
//! ```text
//! ledger-engine/src/
//! ├── engine.rs      # LedgerEngine 门面 + 序列号操作
//! ├── storage.rs     # redb 表定义与事务辅助
//! ├── sequence.rs    # 计数器发号与单据编号
//! ├── money.rs       # Decimal 金额计算
//! ├── stock/         # 库存台账（FEFO 规划、过账、作废）
//! ├── documents/     # 患者 / 排队 / 预约 / 发票 / 目录
//! ├── visits/        # 就诊状态机
//! └── audit/         # 哈希链审计日志
//! ```
//!
//! # Concurrency
//!
//! The engine has no internal scheduler. Concurrent callers (reception,
//! pharmacy, billing workstations) invoke operations freely; redb's
//! single-writer transactions serialize every mutation, and each
//! operation is safe to retry from the top. The audit trail is the one
//! post-commit side-effect and is explicitly best-effort.

pub mod audit;
pub mod documents;
pub mod engine;
mod money;
pub mod sequence;
pub mod stock;
pub mod storage;
pub mod visits;

// Re-export 公共类型
pub use audit::{AuditAction, AuditEntry, AuditQuery, AuditService, AuditStorage, AuditWorker};
pub use engine::LedgerEngine;
pub use sequence::format_doc_no;
pub use stock::fefo;
pub use storage::{LedgerStorage, StorageError, StorageResult};

// Re-export unified error and model types from shared
pub use shared::error::{LedgerError, LedgerResult};
pub use shared::models;

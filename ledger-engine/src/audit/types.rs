//! 审计日志类型定义
//!
//! 所有条目不可变、不可删除，SHA256 哈希链防篡改。

use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
///
/// 按领域分组，每个敏感操作都有明确的类型标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 患者档案 ═══
    /// 患者建档
    PatientCreated,
    /// 患者信息更新
    PatientUpdated,

    // ═══ 排队与预约 ═══
    /// 发放排队号
    QueueTokenIssued,
    /// 排队状态变更
    QueueStatusChanged,
    /// 预约创建
    AppointmentCreated,
    /// 预约状态变更
    AppointmentStatusChanged,

    // ═══ 就诊 ═══
    /// 开始就诊
    VisitOpened,
    /// 就诊记录更新
    VisitUpdated,
    /// 就诊结束
    VisitClosed,

    // ═══ 收费（财务关键）═══
    /// 开具发票
    InvoiceIssued,
    /// 发票作废
    InvoiceVoided,
    /// 收款登记
    PaymentRecorded,

    // ═══ 库存（财务关键）═══
    /// 入库过账
    PurchasePosted,
    /// 入库作废
    PurchaseVoided,
    /// 发药过账
    DispensePosted,
    /// 发药作废
    DispenseVoided,

    // ═══ 管理操作 ═══
    /// 库存品目创建
    StockItemCreated,
    /// 库存品目更新
    StockItemUpdated,
    /// 收费项目创建
    ServiceCreated,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 审计日志条目（不可变）
///
/// 每条记录包含 SHA256 哈希链：
/// - `prev_hash`: 前一条记录的哈希
/// - `curr_hash`: 当前记录的哈希（包含 prev_hash + 所有字段）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 全局递增序列号（唯一标识）
    pub id: u64,
    /// 时间戳（Unix 毫秒）
    pub timestamp: i64,
    /// 操作类型
    pub action: AuditAction,
    /// 诊所（租户）标识
    pub clinic_id: String,
    /// 资源类型，如 "invoice" / "dispense"
    pub resource_type: String,
    /// 资源 ID
    pub resource_id: String,
    /// 操作员 ID
    pub operator_id: Option<String>,
    /// 操作员邮箱
    pub operator_email: Option<String>,
    /// 操作详情（JSON）
    pub details: serde_json::Value,
    /// 前一条记录的哈希
    pub prev_hash: String,
    /// 当前记录的哈希
    pub curr_hash: String,
}

/// 审计日志查询条件
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub clinic_id: Option<String>,
    pub action: Option<AuditAction>,
    pub resource_type: Option<String>,
    /// 起始时间戳（含）
    pub from: Option<i64>,
    /// 结束时间戳（含）
    pub to: Option<i64>,
    /// 返回条数上限（默认 100）
    pub limit: Option<usize>,
}

/// 链验证结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditChainVerification {
    pub valid: bool,
    pub entries_checked: u64,
    /// 第一条哈希不匹配的序列号
    pub first_broken: Option<u64>,
}

//! 会话产出的结果记录与违规事件

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// 交卷原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitReason {
    /// 用户主动交卷
    Manual,
    /// 计时归零
    Timeout,
    /// 违规次数达到上限
    ViolationLimit,
}

/// 违规类型
///
/// 三类环境信号一视同仁计数，类型仅用于外部分析。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// 切换标签页
    TabSwitch,
    /// 退出全屏
    FullscreenExit,
    /// 页面不可见
    VisibilityHidden,
    /// 窗口失焦
    Blur,
}

impl ViolationKind {
    pub fn name(self) -> &'static str {
        match self {
            ViolationKind::TabSwitch => "切换标签页",
            ViolationKind::FullscreenExit => "退出全屏",
            ViolationKind::VisibilityHidden => "页面隐藏",
            ViolationKind::Blur => "窗口失焦",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 一次违规事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// 违规类型
    pub kind: ViolationKind,
    /// 发生时间
    pub occurred_at: DateTime<Local>,
}

impl Violation {
    pub fn new(kind: ViolationKind) -> Self {
        Self {
            kind,
            occurred_at: Local::now(),
        }
    }
}

/// 考试结果
///
/// 每个会话恰好产出一次，产出后不再变更。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    /// 题集ID
    pub set_id: String,
    /// 题目总数
    pub total: usize,
    /// 已作答数量
    pub attempted: usize,
    /// 答对数量
    pub correct: usize,
    /// 答错数量
    pub wrong: usize,
    /// 未作答数量
    pub skipped: usize,
    /// 原始得分 = correct - wrong * negative_marking
    pub raw_score: f64,
    /// 正确率百分比（四舍五入，空卷为 0）
    pub percentage: u32,
    /// 交卷时刻的违规次数
    pub violation_count: usize,
    /// 交卷原因
    pub reason: SubmitReason,
    /// 交卷时间
    pub finished_at: DateTime<Local>,
}

impl ExamResult {
    /// 序列化为 JSON，供外部持久化层存储
    pub fn to_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl std::fmt::Display for ExamResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "对 {} / 错 {} / 空 {} (共 {} 题), 得分 {:.2}, 正确率 {}%",
            self.correct, self.wrong, self.skipped, self.total, self.raw_score, self.percentage
        )
    }
}

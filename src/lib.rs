//! # Exam Session Engine
//!
//! 计时测评会话引擎：把一份题库变成一场受监考的限时考试。
//!
//! ## 架构设计
//!
//! 本引擎采用严格的分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（计时任务、信号订阅），只暴露能力
//! - `CountdownTimer` - 唯一的计时任务 owner，提供倒数回调能力
//! - `SignalSource` - 环境信号的订阅/退订能力，宿主无关
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，无状态纯能力
//! - `BankParser` - 纯文本题库解析能力（部分成功契约）
//! - `reformat` - 确定性文本整形能力（幂等）
//! - `scoring` - 评分与结果编译能力（纯函数）
//! - `AttemptGate` - 作答次数闸门能力（存储可插拔）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场考试"的完整生命周期
//! - `ExamSession` - 状态机编排（Instructions → Playing → Result）
//! - `IntegrityMonitor` - 信号 → 违规 → 强制交卷的接线
//!
//! ## 边界
//!
//! 引擎是进程内库：题集由外部数据层取好喂进来，结果记录吐出
//! 去由外部持久化；不做渲染、不做鉴权、不碰网络。

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::EngineConfig;
pub use error::{AppError, AppResult, SessionError, ValidationError};
pub use infrastructure::{CountdownTimer, EnvironmentSignal, SignalSource, SyntheticSignalSource};
pub use models::{
    AnswerLedger, Difficulty, ExamResult, Question, QuestionSet, SubmitReason, Violation,
    ViolationKind,
};
pub use services::{reformat, AttemptGate, AttemptStore, BankParser, MemoryAttemptStore};
pub use workflow::{ExamSession, Phase};

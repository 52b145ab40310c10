//! 考试会话状态机 - 流程层
//!
//! 核心职责：编排一次计时作答会话的完整生命周期
//!
//! 阶段顺序（不可跳越，Result 为终态）：
//! 1. Instructions → 考前须知，等待 start()
//! 2. Playing → 倒计时与完整性监控并行，用户自由作答
//! 3. Result → 交卷（手动 / 超时 / 违规强制），结果只产出一次
//!
//! 并发模型：计时器回调与信号回调是仅有的两个异步入口，全部
//! 状态收在单个 Mutex<SessionInner> 里；"是否已交卷"用一个
//! AtomicBool 原子抢占，从根上消灭超时与手动交卷竞速导致的
//! 双重计分。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::countdown::CountdownTimer;
use crate::infrastructure::signal_source::SignalSource;
use crate::models::ledger::AnswerLedger;
use crate::models::question::QuestionSet;
use crate::models::result::{ExamResult, SubmitReason, Violation, ViolationKind};
use crate::services::attempt_gate::AttemptGate;
use crate::services::scoring;
use crate::utils::logging::truncate_text;
use crate::workflow::integrity::IntegrityMonitor;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// 考前须知
    Instructions,
    /// 作答中
    Playing,
    /// 已出结果（终态）
    Result,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Instructions => write!(f, "Instructions"),
            Phase::Playing => write!(f, "Playing"),
            Phase::Result => write!(f, "Result"),
        }
    }
}

/// 会话可变状态，整体收在一个锁里
struct SessionInner {
    phase: Phase,
    current_index: usize,
    ledger: AnswerLedger,
    time_remaining: u64,
    violations: Vec<Violation>,
    // timer 与 monitor 的 Drop 自带资源回收，
    // 会话被丢弃（如用户在须知页放弃）时不会泄漏任务和订阅
    timer: Option<CountdownTimer>,
    monitor: Option<IntegrityMonitor>,
    result: Option<ExamResult>,
}

/// 考试会话
///
/// 一个会话绑定一个题集和一个学员，独占自己的账本、计时器
/// 和监控器；跨会话共享的只有注入的计数存储。
pub struct ExamSession {
    set: QuestionSet,
    /// 自引用弱指针（Arc::new_cyclic 填入），回调接线用，不成环
    weak_self: Weak<ExamSession>,
    learner_id: String,
    gate: AttemptGate,
    signal_source: Arc<dyn SignalSource>,
    max_violations: u32,
    /// 提交守卫：swap 成功者独占产出 Result 的权利
    submitted: AtomicBool,
    violation_tx: mpsc::UnboundedSender<Violation>,
    violation_rx: Mutex<Option<mpsc::UnboundedReceiver<Violation>>>,
    inner: Mutex<SessionInner>,
}

impl ExamSession {
    /// 创建会话（停留在 Instructions 阶段）
    ///
    /// # 参数
    /// - `set`: 题集，创建前先整体校验
    /// - `learner_id`: 学员ID
    /// - `gate`: 作答次数闸门
    /// - `signal_source`: 环境信号源
    /// - `config`: 引擎配置（取违规上限）
    pub fn new(
        set: QuestionSet,
        learner_id: impl Into<String>,
        gate: AttemptGate,
        signal_source: Arc<dyn SignalSource>,
        config: &EngineConfig,
    ) -> AppResult<Arc<Self>> {
        set.validate()?;

        let (violation_tx, violation_rx) = mpsc::unbounded_channel();
        let ledger = AnswerLedger::new(set.len());
        let time_remaining = set.time_limit_seconds();
        let learner_id = learner_id.into();

        Ok(Arc::new_cyclic(|weak| Self {
            weak_self: weak.clone(),
            learner_id,
            gate,
            signal_source,
            max_violations: config.max_violations,
            submitted: AtomicBool::new(false),
            violation_tx,
            violation_rx: Mutex::new(Some(violation_rx)),
            inner: Mutex::new(SessionInner {
                phase: Phase::Instructions,
                current_index: 0,
                ledger,
                time_remaining,
                violations: Vec::new(),
                timer: None,
                monitor: None,
                result: None,
            }),
            set,
        }))
    }

    /// 开始作答
    ///
    /// 只允许从 Instructions 进入；次数闸门拒绝时返回
    /// AttemptLimitExceeded。进入 Playing 的同时启动倒计时、
    /// 挂上完整性监控，并把第 0 题标记为到访。
    pub fn start(&self) -> AppResult<()> {
        let mut inner = self.lock_inner()?;
        if inner.phase != Phase::Instructions {
            return Err(AppError::invalid_transition("start", inner.phase));
        }

        if !self.gate.can_start(self.set.id.as_str(), &self.learner_id)? {
            let used = self
                .gate
                .attempts_used(self.set.id.as_str(), &self.learner_id)?;
            return Err(AppError::attempt_limit_exceeded(
                self.set.id.as_str(),
                used,
                self.gate.limit(),
            ));
        }

        inner.phase = Phase::Playing;
        inner.current_index = 0;
        inner.ledger.mark_visited(0);

        // 回调只持 Weak：计时任务不延长会话生命周期，也不成环
        let weak_tick = self.weak_self.clone();
        let weak_expire = self.weak_self.clone();
        inner.timer = Some(CountdownTimer::start(
            inner.time_remaining,
            move |remaining| {
                if let Some(session) = weak_tick.upgrade() {
                    session.on_tick(remaining);
                }
            },
            move || {
                if let Some(session) = weak_expire.upgrade() {
                    info!("⏰ 时间到，自动交卷");
                    let _ = session.submit(SubmitReason::Timeout);
                }
            },
        ));
        inner.monitor = Some(IntegrityMonitor::attach(
            Arc::clone(&self.signal_source),
            self.weak_self.clone(),
        ));

        log_session_start(&self.set, inner.time_remaining, self.max_violations);
        Ok(())
    }

    /// 选择答案
    ///
    /// 只允许在 Playing 阶段；首选即锁定，重复选择静默忽略
    /// （不是错误）。索引越界才报错。
    pub fn select_answer(&self, index: usize, option_text: &str) -> AppResult<()> {
        let mut inner = self.lock_inner()?;
        if inner.phase != Phase::Playing {
            return Err(AppError::invalid_transition("select_answer", inner.phase));
        }
        if index >= self.set.len() {
            return Err(AppError::index_out_of_range(
                index,
                self.set.len().saturating_sub(1),
            ));
        }

        if inner.ledger.record_answer(index, option_text) {
            debug!("题 {} 作答锁定: {}", index, truncate_text(option_text, 40));
        } else {
            debug!("题 {} 已有作答，首选锁定，忽略本次选择", index);
        }
        Ok(())
    }

    /// 跳转到目标题
    ///
    /// 越界目标静默钳制到合法范围；目标题标记为到访。
    /// 自由导航：不要求当前题已作答。返回实际落点。
    pub fn navigate(&self, target_index: usize) -> AppResult<usize> {
        let mut inner = self.lock_inner()?;
        if inner.phase != Phase::Playing {
            return Err(AppError::invalid_transition("navigate", inner.phase));
        }

        let clamped = target_index.min(self.set.len().saturating_sub(1));
        inner.current_index = clamped;
        inner.ledger.mark_visited(clamped);
        Ok(clamped)
    }

    /// 翻转某题的复查标记，返回新状态（对评分无影响）
    pub fn toggle_mark(&self, index: usize) -> AppResult<bool> {
        let mut inner = self.lock_inner()?;
        if inner.phase != Phase::Playing {
            return Err(AppError::invalid_transition("toggle_mark", inner.phase));
        }
        if index >= self.set.len() {
            return Err(AppError::index_out_of_range(
                index,
                self.set.len().saturating_sub(1),
            ));
        }
        Ok(inner.ledger.toggle_mark(index))
    }

    /// 交卷
    ///
    /// 只允许在 Playing 阶段发起。第一次调用停掉计时器和监控、
    /// 编译结果、记一次作答次数并进入 Result；之后的重复调用
    /// （例如超时回调与用户点击竞速）返回 Ok(None)，静默吸收。
    pub fn submit(&self, reason: SubmitReason) -> AppResult<Option<ExamResult>> {
        {
            let inner = self.lock_inner()?;
            if inner.phase == Phase::Instructions {
                return Err(AppError::invalid_transition("submit", inner.phase));
            }
        }

        // 原子抢占提交权：竞速双方只有一方走到下面
        if self.submitted.swap(true, Ordering::SeqCst) {
            debug!("重复交卷被忽略 (原因: {:?})", reason);
            return Ok(None);
        }

        let result = {
            let mut inner = self.lock_inner()?;
            if let Some(timer) = inner.timer.take() {
                timer.cancel();
            }
            if let Some(monitor) = inner.monitor.take() {
                monitor.shutdown();
            }

            let result = scoring::compile(&self.set, &inner.ledger, inner.violations.len(), reason);
            inner.phase = Phase::Result;
            inner.result = Some(result.clone());
            result
        };

        // 次数只在交卷时累加，放弃的会话不计；
        // 上面的提交守卫保证这里每个会话至多执行一次
        self.gate
            .record_attempt(self.set.id.as_str(), &self.learner_id)?;

        log_session_complete(&self.set, &result);
        Ok(Some(result))
    }

    // ========== 回调入口（与用户操作共用同一把锁串行化） ==========

    /// 计时器每秒回调
    fn on_tick(&self, remaining: u64) {
        if let Ok(mut inner) = self.inner.lock() {
            if inner.phase == Phase::Playing {
                inner.time_remaining = remaining;
            }
        }
    }

    /// 监控器上报一次违规
    pub(crate) fn on_signal(&self, kind: ViolationKind) {
        if self.submitted.load(Ordering::SeqCst) {
            return;
        }

        let count = {
            let mut inner = match self.inner.lock() {
                Ok(inner) => inner,
                Err(_) => return,
            };
            if inner.phase != Phase::Playing {
                return;
            }

            let violation = Violation::new(kind);
            // 外部分析流尽力投递，接收端已丢弃则忽略
            let _ = self.violation_tx.send(violation.clone());
            inner.violations.push(violation);
            inner.violations.len()
        };

        warn!(
            "⚠️ 检测到违规: {} ({}/{})",
            kind, count, self.max_violations
        );

        // 锁已释放再交卷，避免重入死锁
        if count as u32 >= self.max_violations {
            warn!("🚫 违规次数达到上限，强制交卷");
            let _ = self.submit(SubmitReason::ViolationLimit);
        }
    }

    // ========== 只读访问 ==========

    pub fn phase(&self) -> Phase {
        self.inner
            .lock()
            .map(|inner| inner.phase)
            .unwrap_or(Phase::Result)
    }

    pub fn current_index(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.current_index)
            .unwrap_or(0)
    }

    pub fn time_remaining(&self) -> u64 {
        self.inner
            .lock()
            .map(|inner| inner.time_remaining)
            .unwrap_or(0)
    }

    pub fn violation_count(&self) -> usize {
        self.inner
            .lock()
            .map(|inner| inner.violations.len())
            .unwrap_or(0)
    }

    /// 违规事件快照
    pub fn violations(&self) -> Vec<Violation> {
        self.inner
            .lock()
            .map(|inner| inner.violations.clone())
            .unwrap_or_default()
    }

    /// 账本快照（界面渲染答题卡用）
    pub fn ledger_snapshot(&self) -> AnswerLedger {
        self.inner
            .lock()
            .map(|inner| inner.ledger.clone())
            .unwrap_or_else(|_| AnswerLedger::new(0))
    }

    /// 已产出的结果（未交卷为 None）
    pub fn result(&self) -> Option<ExamResult> {
        self.inner
            .lock()
            .ok()
            .and_then(|inner| inner.result.clone())
    }

    /// 取走违规事件流的接收端（只能取一次），供外部日志/分析消费
    pub fn violation_stream(&self) -> Option<mpsc::UnboundedReceiver<Violation>> {
        self.violation_rx.lock().ok().and_then(|mut rx| rx.take())
    }

    pub fn question_set(&self) -> &QuestionSet {
        &self.set
    }

    fn lock_inner(&self) -> AppResult<MutexGuard<'_, SessionInner>> {
        self.inner
            .lock()
            .map_err(|_| AppError::Other("会话状态锁中毒".to_string()))
    }
}

// ========== 日志辅助函数 ==========

fn log_session_start(set: &QuestionSet, time_remaining: u64, max_violations: u32) {
    info!("{}", "=".repeat(60));
    info!("📝 会话开始: {}", set.name);
    info!("📚 科目: {} | 题目数: {}", set.subject, set.len());
    info!(
        "⏱️ 限时: {} 秒 | 违规上限: {} 次",
        time_remaining, max_violations
    );
    info!("{}", "=".repeat(60));
}

fn log_session_complete(set: &QuestionSet, result: &ExamResult) {
    info!("{}", "─".repeat(60));
    info!("✅ 会话结束: {} (原因: {:?})", set.name, result.reason);
    info!("📊 {}", result);
    if result.violation_count > 0 {
        info!("⚠️ 违规次数: {}", result.violation_count);
    }
    info!("{}", "─".repeat(60));
}

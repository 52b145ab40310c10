//! 作答次数闸门 - 业务能力层
//!
//! 只负责"还能不能开新会话"这一件事。计数存储通过 trait 注入：
//! 自带的内存实现对应设备本地计数（可被清除，非强账号保证），
//! 服务端权威计数实现同一 trait 即可替换，会话状态机无需改动。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::{AppError, AppResult};

/// 默认作答次数上限
pub const DEFAULT_ATTEMPT_LIMIT: u32 = 3;

/// 计数存储接口
///
/// 键为 (题集, 学员) 二元组。实现方保证 record_attempt 的
/// 每次调用恰好加一；"每次交卷只计一次"由会话的提交守卫保证，
/// 不在存储层重复防御。
pub trait AttemptStore: Send + Sync {
    /// 查询已用次数
    fn attempts_used(&self, set_id: &str, learner_id: &str) -> AppResult<u32>;

    /// 记录一次作答，返回累计次数
    fn record_attempt(&self, set_id: &str, learner_id: &str) -> AppResult<u32>;
}

/// 内存计数存储
///
/// 设备本地语义：进程退出即清零，同一学员换设备重新计数。
#[derive(Default)]
pub struct MemoryAttemptStore {
    counts: Mutex<HashMap<(String, String), u32>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttemptStore for MemoryAttemptStore {
    fn attempts_used(&self, set_id: &str, learner_id: &str) -> AppResult<u32> {
        let counts = self
            .counts
            .lock()
            .map_err(|_| AppError::Other("计数存储锁中毒".to_string()))?;
        Ok(*counts
            .get(&(set_id.to_string(), learner_id.to_string()))
            .unwrap_or(&0))
    }

    fn record_attempt(&self, set_id: &str, learner_id: &str) -> AppResult<u32> {
        let mut counts = self
            .counts
            .lock()
            .map_err(|_| AppError::Other("计数存储锁中毒".to_string()))?;
        let entry = counts
            .entry((set_id.to_string(), learner_id.to_string()))
            .or_insert(0);
        *entry += 1;
        Ok(*entry)
    }
}

/// 作答次数闸门
pub struct AttemptGate {
    store: Arc<dyn AttemptStore>,
    limit: u32,
}

impl AttemptGate {
    /// 创建闸门
    pub fn new(store: Arc<dyn AttemptStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    /// 使用默认上限创建
    pub fn with_default_limit(store: Arc<dyn AttemptStore>) -> Self {
        Self::new(store, DEFAULT_ATTEMPT_LIMIT)
    }

    /// 上限
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// 查询已用次数
    pub fn attempts_used(&self, set_id: &str, learner_id: &str) -> AppResult<u32> {
        self.store.attempts_used(set_id, learner_id)
    }

    /// 是否还允许开新会话
    pub fn can_start(&self, set_id: &str, learner_id: &str) -> AppResult<bool> {
        let used = self.store.attempts_used(set_id, learner_id)?;
        debug!("题集 {} 已作答 {}/{} 次", set_id, used, self.limit);
        Ok(used < self.limit)
    }

    /// 剩余可用次数
    pub fn remaining(&self, set_id: &str, learner_id: &str) -> AppResult<u32> {
        let used = self.store.attempts_used(set_id, learner_id)?;
        Ok(self.limit.saturating_sub(used))
    }

    /// 记录一次作答（只在交卷时调用，开卷不计数）
    pub fn record_attempt(&self, set_id: &str, learner_id: &str) -> AppResult<u32> {
        let used = self.store.record_attempt(set_id, learner_id)?;
        info!("📈 题集 {} 作答次数更新: {}/{}", set_id, used, self.limit);
        Ok(used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_gate(limit: u32) -> AttemptGate {
        AttemptGate::new(Arc::new(MemoryAttemptStore::new()), limit)
    }

    #[test]
    fn test_fresh_learner_can_start() {
        let gate = make_gate(3);
        assert!(gate.can_start("set-1", "stu-1").unwrap());
        assert_eq!(gate.remaining("set-1", "stu-1").unwrap(), 3);
    }

    #[test]
    fn test_limit_blocks_after_three_attempts() {
        let gate = make_gate(3);
        for _ in 0..3 {
            gate.record_attempt("set-1", "stu-1").unwrap();
        }
        assert!(!gate.can_start("set-1", "stu-1").unwrap());
        assert_eq!(gate.remaining("set-1", "stu-1").unwrap(), 0);
    }

    #[test]
    fn test_counters_keyed_per_set_and_learner() {
        let gate = make_gate(1);
        gate.record_attempt("set-1", "stu-1").unwrap();

        assert!(!gate.can_start("set-1", "stu-1").unwrap());
        // 其他题集、其他学员不受影响
        assert!(gate.can_start("set-2", "stu-1").unwrap());
        assert!(gate.can_start("set-1", "stu-2").unwrap());
    }

    #[test]
    fn test_record_returns_running_total() {
        let gate = make_gate(5);
        assert_eq!(gate.record_attempt("set-1", "stu-1").unwrap(), 1);
        assert_eq!(gate.record_attempt("set-1", "stu-1").unwrap(), 2);
    }
}

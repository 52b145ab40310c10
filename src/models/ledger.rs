//! 答题账本
//!
//! 一次会话内所有题目的作答状态：已选答案、是否到访、是否标记待复查。
//! 纯数据结构，不感知计时与违规。

use serde::{Deserialize, Serialize};

/// 单题作答槽位
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSlot {
    /// 已选答案（选项文本，None 表示未作答）
    pub answer: Option<String>,
    /// 是否到访过
    pub visited: bool,
    /// 是否标记待复查
    pub marked: bool,
}

/// 答题账本，槽位数量与题集题目数一致
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerLedger {
    slots: Vec<LedgerSlot>,
}

impl AnswerLedger {
    /// 创建指定长度的空账本
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![LedgerSlot::default(); len],
        }
    }

    /// 槽位数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否为空账本
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 读取槽位
    pub fn slot(&self, index: usize) -> Option<&LedgerSlot> {
        self.slots.get(index)
    }

    /// 所有槽位（评分器遍历用）
    pub fn slots(&self) -> &[LedgerSlot] {
        &self.slots
    }

    /// 记录答案
    ///
    /// 首选即锁定：槽位已有答案时不覆盖，返回 false。
    /// 索引越界同样返回 false，由调用方提前检查。
    pub fn record_answer(&mut self, index: usize, option_text: &str) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.answer.is_none() => {
                slot.answer = Some(option_text.to_string());
                true
            }
            _ => false,
        }
    }

    /// 标记到访
    pub fn mark_visited(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.visited = true;
        }
    }

    /// 翻转复查标记，返回新状态
    pub fn toggle_mark(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                slot.marked = !slot.marked;
                slot.marked
            }
            None => false,
        }
    }

    /// 已作答数量
    pub fn attempted_count(&self) -> usize {
        self.slots.iter().filter(|s| s.answer.is_some()).count()
    }

    /// 到访数量
    pub fn visited_count(&self) -> usize {
        self.slots.iter().filter(|s| s.visited).count()
    }

    /// 标记待复查数量
    pub fn marked_count(&self) -> usize {
        self.slots.iter().filter(|s| s.marked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ledger_is_blank() {
        let ledger = AnswerLedger::new(3);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.attempted_count(), 0);
        assert_eq!(ledger.visited_count(), 0);
        assert!(!ledger.slot(0).unwrap().visited);
    }

    #[test]
    fn test_first_answer_is_binding() {
        let mut ledger = AnswerLedger::new(2);
        assert!(ledger.record_answer(0, "甲"));
        // 第二次写入被拒绝，答案保持不变
        assert!(!ledger.record_answer(0, "乙"));
        assert_eq!(ledger.slot(0).unwrap().answer.as_deref(), Some("甲"));
        assert_eq!(ledger.attempted_count(), 1);
    }

    #[test]
    fn test_record_answer_out_of_range() {
        let mut ledger = AnswerLedger::new(1);
        assert!(!ledger.record_answer(5, "甲"));
    }

    #[test]
    fn test_toggle_mark_flips() {
        let mut ledger = AnswerLedger::new(1);
        assert!(ledger.toggle_mark(0));
        assert!(!ledger.toggle_mark(0));
        assert_eq!(ledger.marked_count(), 0);
    }

    #[test]
    fn test_mark_visited_idempotent() {
        let mut ledger = AnswerLedger::new(2);
        ledger.mark_visited(1);
        ledger.mark_visited(1);
        assert_eq!(ledger.visited_count(), 1);
    }
}

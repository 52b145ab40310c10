//! 评分与结果编译服务 - 业务能力层
//!
//! 纯函数：消费最终账本与题集，产出一次性的结果记录。
//! 负分比例来自题集元数据，绝不在这里写死。

use chrono::Local;
use tracing::debug;

use crate::models::ledger::AnswerLedger;
use crate::models::question::QuestionSet;
use crate::models::result::{ExamResult, SubmitReason};

/// 编译考试结果
///
/// 逐槽位判定：未作答为 skipped；与正确答案文本完全相等为
/// correct；否则为 wrong。比较只看文本，不看位置，选项被外部
/// 打乱也不影响正确性。
///
/// # 参数
/// - `set`: 题集
/// - `ledger`: 最终账本状态
/// - `violation_count`: 交卷时刻的违规次数
/// - `reason`: 交卷原因
pub fn compile(
    set: &QuestionSet,
    ledger: &AnswerLedger,
    violation_count: usize,
    reason: SubmitReason,
) -> ExamResult {
    let mut correct = 0usize;
    let mut wrong = 0usize;
    let mut skipped = 0usize;

    for (question, slot) in set.questions.iter().zip(ledger.slots()) {
        match &slot.answer {
            None => skipped += 1,
            Some(answer) if answer == &question.answer => correct += 1,
            Some(_) => wrong += 1,
        }
    }

    let total = set.len();
    let raw_score = correct as f64 - wrong as f64 * set.negative_marking;
    // 空卷不做除法，百分比定义为 0
    let percentage = if total == 0 {
        0
    } else {
        (correct as f64 / total as f64 * 100.0).round() as u32
    };

    debug!(
        "评分完成: 对 {} / 错 {} / 空 {}, 得分 {:.2}",
        correct, wrong, skipped, raw_score
    );

    ExamResult {
        set_id: set.id.clone(),
        total,
        attempted: correct + wrong,
        correct,
        wrong,
        skipped,
        raw_score,
        percentage,
        violation_count,
        reason,
        finished_at: Local::now(),
    }
}

//! 题库文本解析服务 - 业务能力层
//!
//! 把批量粘贴/上传的松散纯文本转换为结构化题目。
//! 约定：部分成功是契约的一部分——单个块解析失败只产生一条
//! ParseError，绝不中断后续块的解析。

use regex::Regex;
use tracing::debug;

use crate::models::question::{Difficulty, Question};

/// 单个文本块的解析失败原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailReason {
    /// 缺少题干行
    #[error("缺少题干（Q: 行）")]
    MissingStem,
    /// 可用选项不足
    #[error("可用选项不足 2 个（找到 {found} 个）")]
    TooFewOptions { found: usize },
    /// 缺少答案行
    #[error("缺少答案（ANSWER: 行）")]
    MissingAnswer,
    /// 答案既不是合法字母也不等于任何选项文本
    #[error("答案 '{answer}' 无法对应到任何选项")]
    AnswerUnresolved { answer: String },
}

/// 按块上报的解析错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 块索引（按块顺序，从 0 开始）
    pub block_index: usize,
    /// 失败原因
    pub reason: ParseFailReason,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "第 {} 块: {}", self.block_index, self.reason)
    }
}

/// 解析产物：成功的题目与失败的块并存
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// 按块顺序排列的题目，不排序不去重
    pub questions: Vec<Question>,
    /// 被拒绝的块
    pub errors: Vec<ParseError>,
}

/// 题库文本解析器
///
/// 语法（块内行顺序任意）：
/// - `Q:` / `Q.` 题干
/// - 2~4 行 `A`~`D` + `)` / `.` / `:` 选项，出现顺序即选项顺序
/// - `ANSWER:` / `Correct:` 字母或选项原文
/// - 可选 `EXPLAIN:` / `Explanation:`、`Topic:`、`Difficulty:`
pub struct BankParser {
    option_re: Regex,
}

impl BankParser {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self {
            // 单字母标签 + 分隔符 + 选项文本
            option_re: Regex::new(r"^([A-Da-d])[).:]\s*(.*)$").expect("内置正则必定合法"),
        }
    }

    /// 解析整段文本
    ///
    /// # 参数
    /// - `raw_text`: 原始 UTF-8 文本（来源为粘贴或文件上传）
    ///
    /// # 返回
    /// 返回题目列表和按块上报的错误列表，二者并存
    pub fn parse(&self, raw_text: &str) -> ParseOutcome {
        let normalized = raw_text.replace("\r\n", "\n").replace('\r', "\n");
        let blocks = split_blocks(&normalized);

        let mut outcome = ParseOutcome::default();
        for (block_index, lines) in blocks.iter().enumerate() {
            match self.parse_block(lines, block_index) {
                Ok(question) => outcome.questions.push(question),
                Err(reason) => {
                    debug!("块 {} 被拒绝: {}", block_index, reason);
                    outcome.errors.push(ParseError {
                        block_index,
                        reason,
                    });
                }
            }
        }

        debug!(
            "解析完成: {} 个题目, {} 个失败块",
            outcome.questions.len(),
            outcome.errors.len()
        );
        outcome
    }

    /// 解析单个块
    fn parse_block(
        &self,
        lines: &[&str],
        block_index: usize,
    ) -> Result<Question, ParseFailReason> {
        let mut stem: Option<String> = None;
        let mut options: Vec<String> = Vec::new();
        let mut answer_raw: Option<String> = None;
        let mut analysis: Option<String> = None;
        let mut topic: Option<String> = None;
        let mut difficulty = Difficulty::default();

        for raw_line in lines {
            let line = raw_line.trim();
            if line.is_empty() {
                // 块内的纯空白行直接忽略
                continue;
            }

            if let Some(rest) = strip_marker(line, &["Q:", "Q."]) {
                // 重复的题干行以第一条为准
                if stem.is_none() {
                    stem = Some(rest.to_string());
                }
                continue;
            }
            if let Some(rest) = strip_marker(line, &["ANSWER:", "Correct:"]) {
                if answer_raw.is_none() {
                    answer_raw = Some(rest.to_string());
                }
                continue;
            }
            if let Some(rest) = strip_marker(line, &["EXPLAIN:", "Explanation:"]) {
                if analysis.is_none() {
                    analysis = Some(rest.to_string());
                }
                continue;
            }
            if let Some(rest) = strip_marker(line, &["Topic:"]) {
                if topic.is_none() {
                    topic = Some(rest.to_string());
                }
                continue;
            }
            if let Some(rest) = strip_marker(line, &["Difficulty:"]) {
                // 只接受 Easy|Medium|Hard，其余忽略并落到默认值
                difficulty = Difficulty::from_str(rest).unwrap_or_default();
                continue;
            }
            if options.len() < 4 {
                if let Some(caps) = self.option_re.captures(line) {
                    let text = caps[2].trim();
                    if !text.is_empty() {
                        options.push(text.to_string());
                    }
                    continue;
                }
            }
            // 其余行不属于语法，忽略
        }

        let stem = stem.ok_or(ParseFailReason::MissingStem)?;
        if options.len() < 2 {
            return Err(ParseFailReason::TooFewOptions {
                found: options.len(),
            });
        }
        let answer_raw = answer_raw.ok_or(ParseFailReason::MissingAnswer)?;
        let answer = resolve_answer(&answer_raw, &options).ok_or(
            ParseFailReason::AnswerUnresolved {
                answer: answer_raw.clone(),
            },
        )?;

        Ok(Question {
            id: format!("q{}", block_index + 1),
            stem,
            options,
            answer,
            analysis,
            topic,
            difficulty,
        })
    }
}

impl Default for BankParser {
    fn default() -> Self {
        Self::new()
    }
}

/// 按空行切分文本块
///
/// 完全为空的行是块分隔符；只含空白字符的行保留在块内，
/// 由块解析阶段忽略。
fn split_blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// 去掉行首标记，返回剩余文本（去首尾空白）
fn strip_marker<'a>(line: &'a str, markers: &[&str]) -> Option<&'a str> {
    for marker in markers {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    None
}

/// 把答案值解析为选项文本
///
/// 单个字母 A~D 按位置映射回对应选项的文本；否则要求与某个
/// 选项原文完全相等。存储的始终是选项文本，选项被外部打乱后
/// 评分依旧正确。
fn resolve_answer(answer_raw: &str, options: &[String]) -> Option<String> {
    let trimmed = answer_raw.trim();

    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let upper = c.to_ascii_uppercase();
        if ('A'..='D').contains(&upper) {
            let index = (upper as u8 - b'A') as usize;
            return options.get(index).cloned();
        }
    }

    options.iter().find(|o| o.as_str() == trimmed).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_block() {
        let parser = BankParser::new();
        let outcome = parser.parse("Q: 2+2?\nA) 3\nB) 4\nANSWER: B\nEXPLAIN: basic arithmetic");

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.questions.len(), 1);
        let q = &outcome.questions[0];
        assert_eq!(q.stem, "2+2?");
        assert_eq!(q.options, vec!["3".to_string(), "4".to_string()]);
        assert_eq!(q.answer, "4");
        assert_eq!(q.analysis.as_deref(), Some("basic arithmetic"));
        assert_eq!(q.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_parse_partial_failure_keeps_going() {
        let parser = BankParser::new();
        // 第一块缺少 ANSWER 行，第二块合法
        let text = "Q: 第一题\nA) 甲\nB) 乙\n\nQ: 第二题\nA) 对\nB) 错\nANSWER: A";
        let outcome = parser.parse(text);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].block_index, 0);
        assert_eq!(outcome.errors[0].reason, ParseFailReason::MissingAnswer);
        assert_eq!(outcome.questions.len(), 1);
        assert_eq!(outcome.questions[0].stem, "第二题");
        assert_eq!(outcome.questions[0].answer, "对");
    }

    #[test]
    fn test_answer_as_literal_option_text() {
        let parser = BankParser::new();
        let outcome = parser.parse("Q: 哪个是碱？\nA. 盐酸\nB. 氢氧化钠\nANSWER: 氢氧化钠");

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.questions[0].answer, "氢氧化钠");
    }

    #[test]
    fn test_answer_letter_out_of_range() {
        let parser = BankParser::new();
        let outcome = parser.parse("Q: 题干\nA) 甲\nB) 乙\nANSWER: D");

        assert_eq!(outcome.questions.len(), 0);
        assert_eq!(
            outcome.errors[0].reason,
            ParseFailReason::AnswerUnresolved {
                answer: "D".to_string()
            }
        );
    }

    #[test]
    fn test_missing_stem_rejected() {
        let parser = BankParser::new();
        let outcome = parser.parse("A) 甲\nB) 乙\nANSWER: A");
        assert_eq!(outcome.errors[0].reason, ParseFailReason::MissingStem);
    }

    #[test]
    fn test_too_few_options_rejected() {
        let parser = BankParser::new();
        let outcome = parser.parse("Q: 题干\nA) 唯一\nANSWER: A");
        assert_eq!(
            outcome.errors[0].reason,
            ParseFailReason::TooFewOptions { found: 1 }
        );
    }

    #[test]
    fn test_optional_fields() {
        let parser = BankParser::new();
        let text =
            "Q: 题干\nA) 甲\nB) 乙\nCorrect: B\nTopic: 药理学\nDifficulty: Hard\nExplanation: 解析内容";
        let outcome = parser.parse(text);

        let q = &outcome.questions[0];
        assert_eq!(q.topic.as_deref(), Some("药理学"));
        assert_eq!(q.difficulty, Difficulty::Hard);
        assert_eq!(q.analysis.as_deref(), Some("解析内容"));
    }

    #[test]
    fn test_invalid_difficulty_defaults_to_medium() {
        let parser = BankParser::new();
        let outcome = parser.parse("Q: 题干\nA) 甲\nB) 乙\nANSWER: A\nDifficulty: 超纲");
        assert_eq!(outcome.questions[0].difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_crlf_and_multiple_blank_separators() {
        let parser = BankParser::new();
        let text = "Q: 一\r\nA) a\r\nB) b\r\nANSWER: A\r\n\r\n\r\nQ: 二\r\nA) c\r\nB) d\r\nANSWER: B";
        let outcome = parser.parse(text);

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.questions.len(), 2);
        assert_eq!(outcome.questions[0].id, "q1");
        assert_eq!(outcome.questions[1].id, "q2");
    }

    #[test]
    fn test_unknown_lines_ignored() {
        let parser = BankParser::new();
        let text = "这行不属于语法\nQ: 题干\nA) 甲\nB) 乙\nANSWER: A\n   \n尾注";
        let outcome = parser.parse(text);

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.questions.len(), 1);
    }

    #[test]
    fn test_parsed_question_passes_validation() {
        let parser = BankParser::new();
        let outcome = parser.parse("Q: 题干\nA) 甲\nB) 乙\nC) 丙\nD) 丁\nANSWER: c");
        let q = &outcome.questions[0];
        assert_eq!(q.answer, "丙");
        assert!(q.validate().is_ok());
    }
}

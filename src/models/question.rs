use serde::{Deserialize, Serialize};

use crate::error::{AppResult, ValidationError};

/// 难度枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// 简单
    Easy,
    /// 中等
    #[default]
    Medium,
    /// 困难
    Hard,
}

impl Difficulty {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    /// 尝试从字符串解析难度（精确匹配，大小写敏感）
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Easy" => Some(Difficulty::Easy),
            "Medium" => Some(Difficulty::Medium),
            "Hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 单选题
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// 稳定ID
    pub id: String,
    /// 题干
    pub stem: String,
    /// 选项列表（2~6 个，顺序即展示顺序）
    pub options: Vec<String>,
    /// 正确答案，必须与某个选项逐字节相等
    pub answer: String,
    /// 解析
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    /// 知识点标签
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// 难度
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Question {
    /// 校验题目结构
    ///
    /// 规则：
    /// - 题干非空
    /// - 选项数量在 2~6 之间
    /// - 答案必须是某个选项的逐字节拷贝（选项被外部打乱后仍按文本比较）
    pub fn validate(&self) -> AppResult<()> {
        if self.stem.trim().is_empty() {
            return Err(ValidationError::EmptyStem {
                question_id: self.id.clone(),
            }
            .into());
        }
        if self.options.len() < 2 || self.options.len() > 6 {
            return Err(ValidationError::BadOptionCount {
                question_id: self.id.clone(),
                count: self.options.len(),
            }
            .into());
        }
        if !self.options.iter().any(|o| o == &self.answer) {
            return Err(ValidationError::AnswerNotInOptions {
                question_id: self.id.clone(),
                answer: self.answer.clone(),
            }
            .into());
        }
        Ok(())
    }
}

/// 题集：一次会话消费的完整题库 + 会话参数
///
/// 会话开始后视为不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSet {
    /// 题集ID
    pub id: String,
    /// 题集名称
    pub name: String,
    /// 科目
    pub subject: String,
    /// 是否付费内容
    #[serde(default)]
    pub premium: bool,
    /// 时间限制（分钟）
    pub time_limit_minutes: u64,
    /// 负分比例（每道错题扣除的分数比例，0 表示不扣分）
    #[serde(default)]
    pub negative_marking: f64,
    /// 题目列表
    pub questions: Vec<Question>,
    /// 来源文件路径（仅加载器使用）
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

impl QuestionSet {
    /// 题目数量
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// 是否为空题集
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 时间限制换算为秒
    pub fn time_limit_seconds(&self) -> u64 {
        self.time_limit_minutes * 60
    }

    /// 逐题校验，遇到第一个非法题目即返回错误
    pub fn validate(&self) -> AppResult<()> {
        for question in &self.questions {
            question.validate()?;
        }
        Ok(())
    }

    /// 设置来源文件路径
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_question() -> Question {
        Question {
            id: "q1".to_string(),
            stem: "阿司匹林的主要作用机制是？".to_string(),
            options: vec!["抑制COX".to_string(), "阻断受体".to_string()],
            answer: "抑制COX".to_string(),
            analysis: None,
            topic: None,
            difficulty: Difficulty::Medium,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_question().validate().is_ok());
    }

    #[test]
    fn test_validate_answer_must_match_option_text() {
        let mut q = sample_question();
        q.answer = "抑制 COX".to_string(); // 多一个空格，不算逐字节相等
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_validate_option_count() {
        let mut q = sample_question();
        q.options = vec!["唯一选项".to_string()];
        q.answer = "唯一选项".to_string();
        assert!(q.validate().is_err());

        q.options = (0..7).map(|i| format!("选项{}", i)).collect();
        q.answer = "选项0".to_string();
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_difficulty_exact_match_only() {
        assert_eq!(Difficulty::from_str("Hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("hard"), None);
        assert_eq!(Difficulty::from_str("中等"), None);
    }
}

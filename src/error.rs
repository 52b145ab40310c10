use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 会话状态机错误
    Session(SessionError),
    /// 题目校验错误
    Validation(ValidationError),
    /// 计数存储错误
    Store(StoreError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Validation(e) => write!(f, "校验错误: {}", e),
            AppError::Store(e) => write!(f, "存储错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Session(e) => Some(e),
            AppError::Validation(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 会话状态机错误
#[derive(Debug)]
pub enum SessionError {
    /// 非法状态转换（调用方 bug，而非竞态）
    InvalidStateTransition {
        operation: String,
        phase: String,
    },
    /// 作答次数已达上限
    AttemptLimitExceeded {
        set_id: String,
        used: u32,
        limit: u32,
    },
    /// 题目索引超出范围
    IndexOutOfRange {
        index: usize,
        max_index: usize,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidStateTransition { operation, phase } => {
                write!(f, "操作 {} 在 {} 阶段不允许", operation, phase)
            }
            SessionError::AttemptLimitExceeded { set_id, used, limit } => {
                write!(
                    f,
                    "题集 {} 的作答次数已达上限 ({}/{})",
                    set_id, used, limit
                )
            }
            SessionError::IndexOutOfRange { index, max_index } => {
                write!(f, "题目索引 {} 超出范围 [0, {}]", index, max_index)
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// 题目校验错误
#[derive(Debug)]
pub enum ValidationError {
    /// 选项数量不合法（必须在 2~6 之间）
    BadOptionCount {
        question_id: String,
        count: usize,
    },
    /// 正确答案不在选项列表中（要求逐字节相等）
    AnswerNotInOptions {
        question_id: String,
        answer: String,
    },
    /// 题干为空
    EmptyStem {
        question_id: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::BadOptionCount { question_id, count } => {
                write!(f, "题目 {} 的选项数量 {} 不在 2~6 之间", question_id, count)
            }
            ValidationError::AnswerNotInOptions {
                question_id,
                answer,
            } => {
                write!(f, "题目 {} 的答案 '{}' 不在选项列表中", question_id, answer)
            }
            ValidationError::EmptyStem { question_id } => {
                write!(f, "题目 {} 的题干为空", question_id)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// 计数存储错误
#[derive(Debug)]
pub enum StoreError {
    /// 读取作答次数失败
    ReadFailed {
        set_id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入作答次数失败
    WriteFailed {
        set_id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::ReadFailed { set_id, source } => {
                write!(f, "读取题集 {} 的作答次数失败: {}", set_id, source)
            }
            StoreError::WriteFailed { set_id, source } => {
                write!(f, "写入题集 {} 的作答次数失败: {}", set_id, source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::ReadFailed { source, .. } | StoreError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON序列化失败: {}", err))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建非法状态转换错误
    pub fn invalid_transition(operation: impl Into<String>, phase: impl fmt::Display) -> Self {
        AppError::Session(SessionError::InvalidStateTransition {
            operation: operation.into(),
            phase: phase.to_string(),
        })
    }

    /// 创建次数上限错误
    pub fn attempt_limit_exceeded(set_id: impl Into<String>, used: u32, limit: u32) -> Self {
        AppError::Session(SessionError::AttemptLimitExceeded {
            set_id: set_id.into(),
            used,
            limit,
        })
    }

    /// 创建索引越界错误
    pub fn index_out_of_range(index: usize, max_index: usize) -> Self {
        AppError::Session(SessionError::IndexOutOfRange { index, max_index })
    }

    /// 创建存储读取错误
    pub fn store_read_failed(
        set_id: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Store(StoreError::ReadFailed {
            set_id: set_id.into(),
            source: Box::new(source),
        })
    }

    /// 创建存储写入错误
    pub fn store_write_failed(
        set_id: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Store(StoreError::WriteFailed {
            set_id: set_id.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

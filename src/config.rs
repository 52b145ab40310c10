/// 引擎默认配置
///
/// 各项均可被 QuestionSet 自身的元数据覆盖（如负分比例），
/// 这里只提供全局默认值。
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// 违规次数上限，达到后强制交卷
    pub max_violations: u32,
    /// 同一题集允许的作答次数上限
    pub attempt_limit: u32,
    /// 默认负分比例（练习卷为 0，竞赛模考常用 0.25）
    pub default_negative_marking: f64,
    /// TOML 题库存放目录
    pub bank_folder: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_violations: 3,
            attempt_limit: 3,
            default_negative_marking: 0.0,
            bank_folder: "question_bank".to_string(),
            verbose_logging: false,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_violations: std::env::var("MAX_VIOLATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_violations),
            attempt_limit: std::env::var("ATTEMPT_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.attempt_limit),
            default_negative_marking: std::env::var("NEGATIVE_MARKING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_negative_marking),
            bank_folder: std::env::var("BANK_FOLDER").unwrap_or(default.bank_folder),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }
}

use crate::models::question::QuestionSet;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载数据并转换为 QuestionSet 对象
///
/// 加载后立即做结构校验，答案与选项对不上的题集在这里就被拒绝，
/// 不会流入会话。
pub async fn load_toml_to_question_set(toml_file_path: &Path) -> Result<QuestionSet> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let set: QuestionSet = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", toml_file_path.display()))?;

    set.validate()
        .with_context(|| format!("题集校验失败: {}", toml_file_path.display()))?;

    Ok(set.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有 TOML 题集
///
/// 单个文件解析或校验失败只记 warn 并跳过，不影响其余文件。
pub async fn load_all_toml_files(folder_path: &str) -> Result<Vec<QuestionSet>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut question_sets = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_toml_to_question_set(&path).await {
                Ok(set) => {
                    tracing::info!("成功加载题集 {} ({} 个题目)", set.name, set.len());
                    question_sets.push(set);
                }
                Err(e) => {
                    tracing::warn!("加载文件失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(question_sets)
}

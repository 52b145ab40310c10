//! 纯文本整理服务 - 业务能力层
//!
//! 非 AI 的确定性整形器：唯一的职责是把粘贴进来的笔记文本
//! 规整成统一格式。纯字符串函数，无任何隐藏状态，且对自身
//! 输出再应用一次必须是恒等变换（幂等性是可测试的硬性要求）。

use regex::Regex;

/// 整理文本
///
/// 变换内容：
/// 1. 统一行尾为 `\n`
/// 2. 逐行去掉行尾空白
/// 3. `TITLE:` 行与纯粗体行提升为 `##` 标题
/// 4. `*` / `+` / `•` 列表符统一为 `-`
/// 5. 连续 3 个及以上空行压缩为 2 个
pub fn reformat(input: &str) -> String {
    // 这里每次调用都编译正则，换取函数零状态；
    // 调用频率是人工粘贴级别，性能无所谓
    let bold_only_re = Regex::new(r"^\*\*([^*]+)\*\*$").expect("内置正则必定合法");
    let bullet_re = Regex::new(r"^(\s*)[*+•]\s+(.*)$").expect("内置正则必定合法");
    let blank_run_re = Regex::new(r"\n{4,}").expect("内置正则必定合法");
    let leading_blank_re = Regex::new(r"^\n{3,}").expect("内置正则必定合法");

    let normalized = input.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = normalized
        .split('\n')
        .map(|raw_line| {
            let line = raw_line.trim_end();

            if let Some(rest) = line.strip_prefix("TITLE:") {
                let text = rest.trim();
                if text.is_empty() {
                    return "##".to_string();
                }
                return format!("## {}", text);
            }
            if let Some(caps) = bold_only_re.captures(line) {
                return format!("## {}", caps[1].trim());
            }
            if let Some(caps) = bullet_re.captures(line) {
                return format!("{}- {}", &caps[1], &caps[2]);
            }

            line.to_string()
        })
        .collect();

    let joined = lines.join("\n");
    let collapsed = blank_run_re.replace_all(&joined, "\n\n\n");
    leading_blank_re.replace(&collapsed, "\n\n").into_owned()
}

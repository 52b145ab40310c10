//! 完整性监控器 - 流程层
//!
//! 订阅环境信号源，把每次信号转成带时间戳的违规上报给会话。
//! 三类信号一视同仁，不做区分（沿用既有产品的刻意简化）。
//! 升级到强制交卷的判定在会话内完成——"是否已交卷"必须是
//! 单一原子守卫，监控器自己不维护第二份判断。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use crate::infrastructure::signal_source::{SignalCallback, SignalSource, Subscription};
use crate::workflow::exam_session::ExamSession;

/// 完整性监控器
///
/// 职责：
/// - 挂载时订阅信号源并打开页面离开拦截提示
/// - 每个信号转发给会话（持 Weak，不延长会话生命周期）
/// - shutdown 后彻底静默：退订、关闭拦截提示、丢弃后续信号
pub struct IntegrityMonitor {
    disabled: Arc<AtomicBool>,
    subscription: Mutex<Option<Subscription>>,
    source: Arc<dyn SignalSource>,
}

impl IntegrityMonitor {
    /// 挂载到会话
    pub fn attach(source: Arc<dyn SignalSource>, session: Weak<ExamSession>) -> Self {
        let disabled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&disabled);
        let weak = session;

        let callback: SignalCallback = Arc::new(move |signal| {
            if flag.load(Ordering::SeqCst) {
                return;
            }
            if let Some(session) = weak.upgrade() {
                session.on_signal(signal.into());
            }
        });

        let subscription = source.subscribe(callback);
        // 作答期间请求离开确认（尽力而为，拦不住强制关闭）
        source.set_exit_warning(true);
        debug!("完整性监控已挂载");

        Self {
            disabled,
            subscription: Mutex::new(Some(subscription)),
            source,
        }
    }

    /// 停用监控：退订并关闭离开拦截，之后的信号不再产生违规
    pub fn shutdown(&self) {
        self.disabled.store(true, Ordering::SeqCst);
        if let Ok(mut subscription) = self.subscription.lock() {
            // Drop 即退订
            subscription.take();
        }
        self.source.set_exit_warning(false);
        debug!("完整性监控已停用");
    }
}

impl Drop for IntegrityMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

//! 环境信号源 - 基础设施层
//!
//! 可见性变化、窗口失焦、退出全屏这类信号天然绑定宿主运行时。
//! 这里把它抽象成"可订阅的外部信号源"：浏览器宿主从真实事件
//! 驱动，测试与非浏览器宿主用 SyntheticSignalSource 合成驱动。
//! 本模块不认识会话，只负责信号的分发与退订。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::models::result::ViolationKind;

/// 环境信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentSignal {
    /// 切换标签页
    TabSwitch,
    /// 退出全屏
    FullscreenExit,
    /// 页面不可见
    VisibilityHidden,
    /// 窗口失焦
    Blur,
}

impl From<EnvironmentSignal> for ViolationKind {
    fn from(signal: EnvironmentSignal) -> Self {
        match signal {
            EnvironmentSignal::TabSwitch => ViolationKind::TabSwitch,
            EnvironmentSignal::FullscreenExit => ViolationKind::FullscreenExit,
            EnvironmentSignal::VisibilityHidden => ViolationKind::VisibilityHidden,
            EnvironmentSignal::Blur => ViolationKind::Blur,
        }
    }
}

/// 信号回调
pub type SignalCallback = Arc<dyn Fn(EnvironmentSignal) + Send + Sync>;

/// 订阅凭证
///
/// Drop 即退订，持有方不必显式清理。
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// 显式退订（等价于 drop）
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// 外部信号源接口
pub trait SignalSource: Send + Sync {
    /// 订阅信号，返回的凭证在 Drop 时退订
    fn subscribe(&self, callback: SignalCallback) -> Subscription;

    /// 设置页面离开拦截提示（尽力而为，宿主可能不支持）
    fn set_exit_warning(&self, _enabled: bool) {}
}

struct SyntheticInner {
    subscribers: Mutex<HashMap<u64, SignalCallback>>,
    next_id: AtomicU64,
    exit_warning: AtomicBool,
}

/// 合成信号源
///
/// 通过 emit() 人工注入信号，用于测试和任何没有真实浏览器
/// 事件的宿主。
#[derive(Clone)]
pub struct SyntheticSignalSource {
    inner: Arc<SyntheticInner>,
}

impl SyntheticSignalSource {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SyntheticInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                exit_warning: AtomicBool::new(false),
            }),
        }
    }

    /// 注入一个信号，同步分发给所有订阅者
    pub fn emit(&self, signal: EnvironmentSignal) {
        // 先拷贝回调再逐个调用：回调内部可能反过来退订，
        // 持锁调用会死锁
        let callbacks: Vec<SignalCallback> = match self.inner.subscribers.lock() {
            Ok(subscribers) => subscribers.values().cloned().collect(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(signal);
        }
    }

    /// 当前订阅者数量（用于泄漏检测）
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .map(|s| s.len())
            .unwrap_or(0)
    }

    /// 页面离开拦截提示是否开启
    pub fn exit_warning_enabled(&self) -> bool {
        self.inner.exit_warning.load(Ordering::SeqCst)
    }
}

impl Default for SyntheticSignalSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for SyntheticSignalSource {
    fn subscribe(&self, callback: SignalCallback) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut subscribers) = self.inner.subscribers.lock() {
            subscribers.insert(id, callback);
        }

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            if let Ok(mut subscribers) = inner.subscribers.lock() {
                subscribers.remove(&id);
            }
        })
    }

    fn set_exit_warning(&self, enabled: bool) {
        self.inner.exit_warning.store(enabled, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_subscriber() {
        let source = SyntheticSignalSource::new();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);

        let _sub = source.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        source.emit(EnvironmentSignal::Blur);
        source.emit(EnvironmentSignal::TabSwitch);
        assert_eq!(received.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let source = SyntheticSignalSource::new();
        let received = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&received);

        let sub = source.subscribe(Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(source.subscriber_count(), 1);

        drop(sub);
        assert_eq!(source.subscriber_count(), 0);

        source.emit(EnvironmentSignal::Blur);
        assert_eq!(received.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let source = SyntheticSignalSource::new();
        let sub = source.subscribe(Arc::new(|_| {}));
        sub.unsubscribe();
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_exit_warning_flag() {
        let source = SyntheticSignalSource::new();
        assert!(!source.exit_warning_enabled());
        source.set_exit_warning(true);
        assert!(source.exit_warning_enabled());
    }

    #[test]
    fn test_signal_maps_to_violation_kind() {
        assert_eq!(
            ViolationKind::from(EnvironmentSignal::FullscreenExit),
            ViolationKind::FullscreenExit
        );
    }
}

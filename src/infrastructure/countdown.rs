//! 倒计时器 - 基础设施层
//!
//! 持有唯一的计时任务资源，只暴露"倒数并回调"的能力。
//! 不认识 Session / Ledger，不处理业务流程。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

/// 单调倒计时器
///
/// 职责：
/// - 每个真实秒递减一次并回调 on_tick(remaining)
/// - 归零时恰好调用一次 on_expire
/// - cancel() 幂等，过期后调用也安全
/// - Drop 时自动取消，杜绝跨会话泄漏计时任务
pub struct CountdownTimer {
    cancelled: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CountdownTimer {
    /// 启动倒计时
    ///
    /// # 参数
    /// - `total_seconds`: 总秒数，0 表示立即过期
    /// - `on_tick`: 每秒回调，参数为剩余秒数
    /// - `on_expire`: 归零回调，至多执行一次
    pub fn start<T, E>(total_seconds: u64, on_tick: T, on_expire: E) -> Self
    where
        T: Fn(u64) + Send + 'static,
        E: FnOnce() + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = tokio::spawn(async move {
            let mut remaining = total_seconds;
            let mut ticker = time::interval(Duration::from_secs(1));
            // interval 的第一次 tick 立即完成，先消费掉
            ticker.tick().await;

            while remaining > 0 {
                ticker.tick().await;
                if flag.load(Ordering::SeqCst) {
                    debug!("倒计时已取消，剩余 {} 秒", remaining);
                    return;
                }
                remaining -= 1;
                on_tick(remaining);
            }

            // 抢占取消标记：on_expire 与 cancel 互斥，保证至多一次
            if !flag.swap(true, Ordering::SeqCst) {
                on_expire();
            }
        });

        Self {
            cancelled,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// 取消倒计时（幂等，过期后调用安全）
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Ok(mut handle) = self.handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }

    /// 是否已取消或已过期
    pub fn is_finished(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn test_expire_fires_exactly_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let _timer = CountdownTimer::start(2, |_| {}, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_seconds_expires_immediately() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let _timer = CountdownTimer::start(0, |_| {}, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_count_down() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _timer = CountdownTimer::start(
            3,
            move |remaining| {
                if let Ok(mut v) = sink.lock() {
                    v.push(remaining);
                }
            },
            || {},
        );

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(*seen.lock().unwrap(), vec![2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_expiry_and_is_idempotent() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let timer = CountdownTimer::start(5, |_| {}, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        timer.cancel();
        timer.cancel(); // 幂等
        time::sleep(Duration::from_secs(30)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(timer.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_expiry_is_safe() {
        let timer = CountdownTimer::start(1, |_| {}, || {});
        time::sleep(Duration::from_secs(5)).await;
        timer.cancel();
        assert!(timer.is_finished());
    }
}

//! 中断信号
//!
//! Ctrl+C / SIGTERM 转换成一个可以在 `select!` 中等待的信号，
//! 批处理在收到信号后停止并保存进度。

use tokio::sync::watch;
use tracing::{debug, warn};

/// 触发端
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// 接收端，可克隆
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

/// 创建一对未触发的触发端 / 接收端
pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    /// 发出中断信号（可重复调用）
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownSignal {
    /// 安装进程信号处理，返回对应的接收端
    ///
    /// 必须在 tokio 运行时内调用
    pub fn install() -> Self {
        let (trigger, signal) = channel();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            warn!("\n⚠️ 检测到中断信号，正在保存进度...");
            trigger.trigger();
        });
        debug!("已安装中断信号处理");
        signal
    }

    /// 一个永远不会触发的接收端
    pub fn never() -> Self {
        let (trigger, signal) = channel();
        // 发送端一旦被丢弃，recv() 将永远挂起
        drop(trigger);
        signal
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等待中断信号；发送端被丢弃且未触发时永远挂起
    pub async fn recv(&mut self) {
        if *self.rx.borrow_and_update() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow_and_update() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("⚠️ 无法监听 Ctrl+C: {}", e);
        std::future::pending::<()>().await
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            warn!("⚠️ 无法监听 SIGTERM: {}", e);
            ctrl_c().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() {
    ctrl_c().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_recv_wakes_on_trigger() {
        let (trigger, mut signal) = channel();
        assert!(!signal.is_triggered());

        let mut recv = task::spawn(signal.recv());
        assert_pending!(recv.poll());

        trigger.trigger();
        assert!(recv.is_woken());
        assert_ready!(recv.poll());
    }

    #[test]
    fn test_trigger_before_recv_is_observed() {
        let (trigger, mut signal) = channel();
        trigger.trigger();
        drop(trigger);

        assert!(signal.is_triggered());
        let mut recv = task::spawn(signal.recv());
        assert_ready!(recv.poll());
    }

    #[test]
    fn test_never_stays_pending() {
        let mut signal = ShutdownSignal::never();
        let mut recv = task::spawn(signal.recv());
        assert_pending!(recv.poll());
        assert_pending!(recv.poll());
    }

    #[test]
    fn test_clones_share_the_signal() {
        let (trigger, signal) = channel();
        let mut other = signal.clone();
        trigger.trigger();

        let mut recv = task::spawn(other.recv());
        assert_ready!(recv.poll());
        assert!(signal.is_triggered());
    }
}

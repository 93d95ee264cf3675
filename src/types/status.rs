use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{info, warn};

/// 界面显示的最近一次链路/解析状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Connected,
    Disconnected,
    DecodeError(String),
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStatus::Connected => write!(f, "Connected"),
            PipelineStatus::Disconnected => write!(f, "Disconnected"),
            PipelineStatus::DecodeError(detail) => write!(f, "Decode error: {}", detail),
        }
    }
}

/// 单次连接的生命周期
///
/// `Idle -> Connecting -> Connected -> Disconnected`。解码错误只体现在
/// [`PipelineStatus`] 上，状态仍保持 `Connected`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug)]
struct StatusInner {
    state: PipelineState,
    status: PipelineStatus,
}

/// 管线状态和记录计数，采集线程写入，快照消费端和界面读取
#[derive(Debug)]
pub struct StatusCell {
    inner: Mutex<StatusInner>,
    accepted: AtomicU64,
    rejected: AtomicU64,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StatusInner {
                state: PipelineState::Idle,
                status: PipelineStatus::Disconnected,
            }),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state
    }

    pub fn status(&self) -> PipelineStatus {
        self.lock().status.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == PipelineState::Connected
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn set_connecting(&self) {
        let mut inner = self.lock();
        if inner.state != PipelineState::Idle {
            warn!("Ignoring Connecting transition from {:?}", inner.state);
            return;
        }
        inner.state = PipelineState::Connecting;
    }

    pub fn set_connected(&self) {
        let mut inner = self.lock();
        match inner.state {
            PipelineState::Idle | PipelineState::Connecting => {
                inner.state = PipelineState::Connected;
                inner.status = PipelineStatus::Connected;
                info!("Pipeline connected");
            }
            PipelineState::Connected => {}
            // 断开后该连接实例不可再用，重连需要新的实例
            PipelineState::Disconnected => {
                warn!("Ignoring Connected transition on a closed connection");
            }
        }
    }

    /// 计数一条有效记录，并清除之前的解码错误
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        if inner.state == PipelineState::Connected
            && matches!(inner.status, PipelineStatus::DecodeError(_))
        {
            inner.status = PipelineStatus::Connected;
        }
    }

    pub fn report_decode_error(&self, detail: String) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        let mut inner = self.lock();
        if inner.state == PipelineState::Connected {
            inner.status = PipelineStatus::DecodeError(detail);
        }
    }

    pub fn set_disconnected(&self) {
        let mut inner = self.lock();
        if inner.state != PipelineState::Disconnected {
            info!("Pipeline disconnected (was {:?})", inner.state);
        }
        inner.state = PipelineState::Disconnected;
        inner.status = PipelineStatus::Disconnected;
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

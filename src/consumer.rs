use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error};
use serde_json::json;

use crate::store::{WindowSnapshot, WindowStore};
use crate::types::{PipelineStatus, StatusCell};

/// 每个周期交给渲染端的一帧
#[derive(Debug, Clone, PartialEq)]
pub enum RenderFrame {
    /// 未连接，不做快照
    Idle { status: PipelineStatus },
    Live {
        snapshot: WindowSnapshot,
        status: PipelineStatus,
        accepted: u64,
        rejected: u64,
    },
}

impl RenderFrame {
    pub fn status(&self) -> &PipelineStatus {
        match self {
            RenderFrame::Idle { status } | RenderFrame::Live { status, .. } => status,
        }
    }

    pub fn snapshot(&self) -> Option<&WindowSnapshot> {
        match self {
            RenderFrame::Idle { .. } => None,
            RenderFrame::Live { snapshot, .. } => Some(snapshot),
        }
    }
}

/// 渲染端：GUI 或 JSON 输出
pub trait Renderer {
    fn render(&mut self, frame: &RenderFrame);
}

/// 按固定周期读取窗口存储，从不写入
pub struct SnapshotConsumer {
    store: Arc<WindowStore>,
    status: Arc<StatusCell>,
    period: Duration,
    last_tick: Option<Instant>,
}

impl SnapshotConsumer {
    pub fn new(store: Arc<WindowStore>, status: Arc<StatusCell>, period: Duration) -> Self {
        Self {
            store,
            status,
            period,
            last_tick: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// 生成当前时刻的一帧
    pub fn frame(&self) -> RenderFrame {
        let status = self.status.status();
        if !self.status.is_connected() {
            return RenderFrame::Idle { status };
        }
        RenderFrame::Live {
            snapshot: self.store.snapshot(),
            status,
            accepted: self.status.accepted(),
            rejected: self.status.rejected(),
        }
    }

    /// 距上一帧满一个周期才返回新帧，供自带循环的调用方（GUI 重绘）使用
    pub fn poll(&mut self, now: Instant) -> Option<RenderFrame> {
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < self.period {
                return None;
            }
        }
        self.last_tick = Some(now);
        Some(self.frame())
    }
}

/// 在定时线程中驱动 `renderer`，直到 `shutdown` 被置位
pub fn spawn_consumer<R>(
    consumer: SnapshotConsumer,
    mut renderer: R,
    shutdown: Arc<AtomicBool>,
) -> io::Result<JoinHandle<()>>
where
    R: Renderer + Send + 'static,
{
    thread::Builder::new()
        .name("snapshot-consumer".to_string())
        .spawn(move || {
            let ticker = crossbeam_channel::tick(consumer.period());
            while ticker.recv().is_ok() {
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                let frame = consumer.frame();
                debug!(
                    "Rendering frame: {} ({} samples)",
                    frame.status(),
                    frame.snapshot().map_or(0, |s| s.len())
                );
                renderer.render(&frame);
            }
        })
}

/// 每帧输出一行 JSON
pub struct JsonLinesRenderer<W> {
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn frame_json(frame: &RenderFrame) -> serde_json::Value {
        match frame {
            RenderFrame::Idle { status } => json!({
                "state": "idle",
                "status": status.to_string(),
            }),
            RenderFrame::Live {
                snapshot,
                status,
                accepted,
                rejected,
            } => {
                let channels: serde_json::Map<String, serde_json::Value> = snapshot
                    .iter()
                    .map(|(channel, values)| (channel.label().to_string(), json!(values)))
                    .collect();
                json!({
                    "state": "live",
                    "status": status.to_string(),
                    "accepted": accepted,
                    "rejected": rejected,
                    "first_seq": snapshot.first_seq,
                    "total_pushed": snapshot.total_pushed,
                    "channels": channels,
                })
            }
        }
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, frame: &RenderFrame) {
        let line = Self::frame_json(frame).to_string();
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            error!("Failed to write frame: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;
    use std::sync::Mutex;

    fn setup() -> (Arc<WindowStore>, Arc<StatusCell>) {
        (Arc::new(WindowStore::new(100)), Arc::new(StatusCell::new()))
    }

    #[test]
    fn idle_when_not_connected() {
        let (store, status) = setup();
        store.push(&Sample::new([1.0, 0.0, 0.0], [0.0, 0.0, 0.0]));
        let consumer = SnapshotConsumer::new(store, status, Duration::from_millis(100));

        assert_eq!(
            consumer.frame(),
            RenderFrame::Idle {
                status: PipelineStatus::Disconnected
            }
        );
    }

    #[test]
    fn live_frame_carries_snapshot() {
        let (store, status) = setup();
        status.set_connected();
        let sample = Sample::new([1.0, 0.0, -1.0], [1.0, 0.0, -1.0]);
        store.push(&sample);
        status.record_accepted();

        let consumer = SnapshotConsumer::new(store.clone(), status, Duration::from_millis(100));
        let frame = consumer.frame();
        let snapshot = frame.snapshot().unwrap();
        assert_eq!(snapshot.latest(), Some(sample));

        // 快照是拷贝，之后的写入不影响它
        store.push(&sample);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn poll_respects_period() {
        let (store, status) = setup();
        let mut consumer = SnapshotConsumer::new(store, status, Duration::from_millis(100));
        let t0 = Instant::now();

        assert!(consumer.poll(t0).is_some());
        assert!(consumer.poll(t0 + Duration::from_millis(50)).is_none());
        assert!(consumer.poll(t0 + Duration::from_millis(100)).is_some());
        assert!(consumer.poll(t0 + Duration::from_millis(150)).is_none());
    }

    #[test]
    fn json_renderer_writes_one_line_per_frame() {
        let (store, status) = setup();
        let consumer = SnapshotConsumer::new(store.clone(), status.clone(), Duration::from_millis(10));
        let mut renderer = JsonLinesRenderer::new(Vec::new());

        renderer.render(&consumer.frame());
        status.set_connected();
        store.push(&Sample::new([0.5, 0.0, 1.0], [2.0, 0.0, 0.0]));
        renderer.render(&consumer.frame());

        let output = String::from_utf8(renderer.out).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["state"], "idle");
        assert_eq!(lines[1]["state"], "live");
        assert_eq!(lines[1]["channels"]["ACC X"], json!([0.5]));
        assert_eq!(lines[1]["channels"]["GYRO X"], json!([2.0]));
        assert_eq!(lines[1]["total_pushed"], 1);
    }

    struct Collecting(Arc<Mutex<Vec<RenderFrame>>>);

    impl Renderer for Collecting {
        fn render(&mut self, frame: &RenderFrame) {
            self.0.lock().unwrap().push(frame.clone());
        }
    }

    #[test]
    fn spawned_consumer_ticks_until_shutdown() {
        let (store, status) = setup();
        status.set_connected();
        let frames = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let consumer = SnapshotConsumer::new(store.clone(), status, Duration::from_millis(5));
        let handle = spawn_consumer(consumer, Collecting(frames.clone()), shutdown.clone()).unwrap();

        for n in 0..20 {
            store.push(&Sample::new([n as f64, 0.0, 0.0], [0.0, 0.0, 0.0]));
            thread::sleep(Duration::from_millis(2));
        }
        while frames.lock().unwrap().len() < 3 {
            thread::sleep(Duration::from_millis(5));
        }
        shutdown.store(true, Ordering::Relaxed);
        handle.join().unwrap();

        let frames = frames.lock().unwrap();
        for frame in frames.iter() {
            let snapshot = frame.snapshot().unwrap();
            assert!(snapshot.len() <= 100);
            for (_, values) in snapshot.iter() {
                assert_eq!(values.len(), snapshot.len());
            }
        }
    }
}

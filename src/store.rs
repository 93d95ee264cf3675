use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::{Channel, Sample, CHANNEL_COUNT};

/// 默认每个通道保留的样本数
pub const DEFAULT_WINDOW_CAPACITY: usize = 100;

/// 单个通道的定长历史，最旧的数据在前
#[derive(Debug, Clone)]
pub struct ChannelWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl ChannelWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        // 超过容量时移除最旧的数据 - O(1)
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[derive(Debug)]
struct StoreInner {
    windows: [ChannelWindow; CHANNEL_COUNT],
    pushed: u64,
}

/// 六个通道窗口共用一把锁
///
/// `push` 是唯一的写入路径，六个值在同一次加锁内写入；`snapshot`
/// 看到的每个样本要么完整写入，要么完全没有写入。
#[derive(Debug)]
pub struct WindowStore {
    inner: Mutex<StoreInner>,
    capacity: usize,
}

impl WindowStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                windows: std::array::from_fn(|_| ChannelWindow::new(capacity)),
                pushed: 0,
            }),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // push 在持锁期间不会 panic，中毒后的数据仍然一致
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, sample: &Sample) {
        let mut inner = self.lock();
        for channel in Channel::ALL {
            inner.windows[channel.index()].push(sample.get(channel));
        }
        inner.pushed += 1;
    }

    /// 复制所有窗口的当前内容
    pub fn snapshot(&self) -> WindowSnapshot {
        let inner = self.lock();
        let len = inner.windows[0].len();
        WindowSnapshot {
            series: std::array::from_fn(|i| inner.windows[i].to_vec()),
            first_seq: inner.pushed - len as u64,
            total_pushed: inner.pushed,
            capacity: self.capacity,
        }
    }

    /// 清空所有窗口，连接断开时调用
    pub fn reset(&self) {
        let mut inner = self.lock();
        for window in inner.windows.iter_mut() {
            window.clear();
        }
        inner.pushed = 0;
    }
}

/// 某一时刻所有通道窗口的只读拷贝
///
/// 各通道第 `i` 项来自同一个样本，其到达序号为 `first_seq + i`。
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    series: [Vec<f64>; CHANNEL_COUNT],
    pub first_seq: u64,
    pub total_pushed: u64,
    pub capacity: usize,
}

impl WindowSnapshot {
    pub fn channel(&self, channel: Channel) -> &[f64] {
        &self.series[channel.index()]
    }

    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 窗口中最新的样本
    pub fn latest(&self) -> Option<Sample> {
        let last = self.len().checked_sub(1)?;
        let v = |c: Channel| self.series[c.index()][last];
        Some(Sample::new(
            [v(Channel::AccelX), v(Channel::AccelY), v(Channel::AccelZ)],
            [v(Channel::GyroX), v(Channel::GyroY), v(Channel::GyroZ)],
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &[f64])> {
        Channel::ALL
            .into_iter()
            .map(move |channel| (channel, self.channel(channel)))
    }
}

#[cfg(test)]
impl WindowStore {
    pub fn len(&self) -> usize {
        self.lock().windows[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    // 每个通道的值都编码了序号和通道号，方便检查对齐
    fn numbered(n: u64) -> Sample {
        let v = n as f64;
        Sample::new([v, v + 0.1, v + 0.2], [v + 0.3, v + 0.4, v + 0.5])
    }

    fn assert_aligned(snapshot: &WindowSnapshot) {
        for i in 0..snapshot.len() {
            let seq = snapshot.first_seq + i as u64;
            let expected = numbered(seq);
            for (channel, values) in snapshot.iter() {
                assert_eq!(values.len(), snapshot.len());
                assert_eq!(values[i], expected.get(channel));
            }
        }
    }

    #[test]
    fn window_evicts_oldest_when_full() {
        let mut window = ChannelWindow::new(3);
        for v in 1..=5 {
            window.push(v as f64);
        }
        assert_eq!(window.to_vec(), vec![3.0, 4.0, 5.0]);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn zero_capacity_window_stays_empty() {
        let mut window = ChannelWindow::new(0);
        window.push(1.0);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn partial_fill_keeps_arrival_order() {
        let store = WindowStore::new(100);
        for n in 0..42 {
            store.push(&numbered(n));
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 42);
        assert_eq!(snapshot.first_seq, 0);
        assert_aligned(&snapshot);
    }

    #[test]
    fn overflow_keeps_last_capacity_values() {
        let store = WindowStore::new(100);
        for n in 0..250 {
            store.push(&numbered(n));
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.first_seq, 150);
        assert_eq!(snapshot.total_pushed, 250);
        assert_eq!(snapshot.channel(Channel::AccelX)[0], 150.0);
        assert_eq!(snapshot.channel(Channel::AccelX)[99], 249.0);
        assert_aligned(&snapshot);
    }

    #[test]
    fn exactly_full_window() {
        let store = WindowStore::new(100);
        for n in 0..100 {
            store.push(&numbered(n));
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.first_seq, 0);

        store.push(&numbered(100));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.first_seq, 1);
        assert_aligned(&snapshot);
    }

    #[test]
    fn snapshot_is_independent_of_later_pushes() {
        let store = WindowStore::new(10);
        store.push(&numbered(0));
        let before = store.snapshot();
        for n in 1..20 {
            store.push(&numbered(n));
        }
        assert_eq!(before.len(), 1);
        assert_eq!(before.channel(Channel::GyroZ), &[0.5]);
        assert_eq!(before.latest(), Some(numbered(0)));
    }

    #[test]
    fn same_sample_fills_every_slot() {
        let sample = Sample::new([1.0, 0.0, -1.0], [1.0, 0.0, -1.0]);
        let store = WindowStore::new(100);
        for _ in 0..101 {
            store.push(&sample);
        }
        let snapshot = store.snapshot();
        for (channel, values) in snapshot.iter() {
            assert_eq!(values.len(), 100);
            assert!(values.iter().all(|&v| v == sample.get(channel)));
        }
    }

    #[test]
    fn reset_empties_every_window() {
        let store = WindowStore::new(5);
        store.push(&numbered(1));
        store.reset();
        let snapshot = store.snapshot();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.total_pushed, 0);
        assert_eq!(snapshot.capacity, 5);
        assert_eq!(snapshot.latest(), None);
    }

    #[test]
    fn concurrent_push_and_snapshot_never_tear() {
        let store = Arc::new(WindowStore::new(100));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                for n in 0..20_000 {
                    store.push(&numbered(n));
                }
                done.store(true, Ordering::Release);
            })
        };

        let mut observed = 0;
        while !done.load(Ordering::Acquire) || observed == 0 {
            let snapshot = store.snapshot();
            assert!(snapshot.len() <= 100);
            assert_aligned(&snapshot);
            observed += 1;
        }
        writer.join().unwrap();

        let last = store.snapshot();
        assert_eq!(last.len(), 100);
        assert_eq!(last.total_pushed, 20_000);
        assert_aligned(&last);
    }
}

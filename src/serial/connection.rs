use std::io::{self, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};

use super::ingest::run_ingestion;
use super::simulator::SimulatedLineSource;
use super::source::{ChannelLineSource, LineSource, ReaderLineSource, TransportError};
use crate::config::{PipelineConfig, SerialConfig};
use crate::store::WindowStore;
use crate::types::StatusCell;

/// 关闭连接时等待采集线程退出的最长时间
const CLOSE_TIMEOUT: Duration = Duration::from_millis(500);

/// 选择内置模拟器的端口名
pub const SIMULATOR_PORT: &str = "sim";
/// 从标准输入读取的端口名
pub const STDIN_PORT: &str = "-";

/// 一次连接：独立的窗口存储、状态和采集线程
///
/// 断开后该实例保持断开，重连需要新建 `Connection`。
pub struct Connection {
    name: String,
    store: Arc<WindowStore>,
    status: Arc<StatusCell>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Connection {
    /// 启动采集线程；`opener` 在采集线程中执行，打开设备慢也不会阻塞调用方
    pub fn open<F, S>(name: impl Into<String>, capacity: usize, opener: F) -> io::Result<Self>
    where
        F: FnOnce() -> Result<S, TransportError> + Send + 'static,
        S: LineSource + 'static,
    {
        let name = name.into();
        let store = Arc::new(WindowStore::new(capacity));
        let status = Arc::new(StatusCell::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        status.set_connecting();
        info!("Connecting to {}", name);

        let thread_store = Arc::clone(&store);
        let thread_status = Arc::clone(&status);
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_name = name.clone();

        let spawned = thread::Builder::new()
            .name("serial-ingest".to_string())
            .spawn(move || {
                match opener() {
                    Ok(source) => {
                        match run_ingestion(source, &thread_store, &thread_status, &thread_shutdown) {
                            Ok(exit) => info!("Ingestion from {} stopped: {:?}", thread_name, exit),
                            Err(e) => error!("Lost connection to {}: {}", thread_name, e),
                        }
                    }
                    Err(e) => {
                        error!("Could not connect to {}: {}", thread_name, e);
                        thread_status.set_disconnected();
                    }
                }
                // 断开后窗口数据不再有效
                thread_store.reset();
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                status.set_disconnected();
                return Err(e);
            }
        };

        Ok(Self {
            name,
            store,
            status,
            shutdown,
            handle: Some(handle),
        })
    }

    /// 按串口配置打开数据源：模拟器、标准输入或串口设备
    pub fn open_configured(serial: &SerialConfig, pipeline: &PipelineConfig) -> io::Result<Self> {
        let poll_interval = Duration::from_millis(pipeline.poll_interval_ms);
        let capacity = pipeline.window_capacity;

        if serial.simulate || serial.port == SIMULATOR_PORT {
            let serial = serial.clone();
            return Self::open("simulator", capacity, move || {
                SimulatedLineSource::from_config(&serial, poll_interval)
            });
        }

        if serial.port == STDIN_PORT {
            return Self::open("stdin", capacity, move || ChannelLineSource::stdin(poll_interval));
        }

        let port = serial.port.clone();
        let baud_rate = serial.baud_rate;
        Self::open(port.clone(), capacity, move || {
            // 读超时等于轮询间隔，空闲时采集循环能及时看到关闭信号
            let device = serialport::new(&port, baud_rate)
                .timeout(poll_interval)
                .open()?;
            info!("Opened {} at {} baud", port, baud_rate);
            Ok(ReaderLineSource::new(BufReader::new(device)))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Arc<WindowStore> {
        &self.store
    }

    pub fn status(&self) -> &Arc<StatusCell> {
        &self.status
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// 通知采集线程停止，并在限定时间内等待其退出
    pub fn close(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let Some(handle) = self.handle.take() else {
            return;
        };

        let deadline = Instant::now() + CLOSE_TIMEOUT;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }

        if handle.is_finished() {
            if handle.join().is_err() {
                error!("Ingestion thread for {} panicked", self.name);
            }
        } else {
            // 数据源没有按轮询间隔返回，线程会在下一次读取返回后自行退出
            warn!("Ingestion thread for {} did not stop within {:?}", self.name, CLOSE_TIMEOUT);
        }

        self.status.set_disconnected();
        info!("Closed connection to {}", self.name);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.close();
    }
}

use std::time::{Duration, Instant};

use log::{error, info};

use crate::config::{AppConfig, ConfigError, ConfigManager};
use crate::consumer::{RenderFrame, Renderer, SnapshotConsumer};
use crate::serial::Connection;
use crate::types::{PipelineState, PipelineStatus};

/// 应用状态管理模块
/// 界面只持有连接句柄和最近一帧快照，不直接访问采集数据

/// 连接状态
pub struct LinkState {
    pub port_input: String,
    pub connection: Option<Connection>,
    pub consumer: Option<SnapshotConsumer>,
    pub last_error: String,
}

/// 统一的应用状态管理
pub struct AppState {
    pub settings: ConfigManager,
    pub link: LinkState,
    pub frame: RenderFrame,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(settings: ConfigManager) -> Self {
        let config = settings.get_config();
        let port_input = if config.serial.simulate {
            crate::serial::connection::SIMULATOR_PORT.to_string()
        } else {
            config.serial.port.clone()
        };

        Self {
            settings,
            link: LinkState {
                port_input,
                connection: None,
                consumer: None,
                last_error: String::new(),
            },
            frame: RenderFrame::Idle {
                status: PipelineStatus::Disconnected,
            },
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.settings.get_config()
    }

    pub fn snapshot_period(&self) -> Duration {
        Duration::from_millis(self.config().pipeline.snapshot_period_ms)
    }

    /// 当前连接的生命周期状态
    pub fn pipeline_state(&self) -> PipelineState {
        self.link
            .connection
            .as_ref()
            .map_or(PipelineState::Idle, |c| c.status().state())
    }

    /// 打开新连接；旧连接先关闭，每次连接使用新的窗口存储
    pub fn connect(&mut self) {
        self.disconnect();

        let mut serial = self.config().serial.clone();
        serial.port = self.link.port_input.trim().to_string();
        serial.simulate = false;

        match Connection::open_configured(&serial, &self.config().pipeline) {
            Ok(connection) => {
                self.link.consumer = Some(SnapshotConsumer::new(
                    connection.store().clone(),
                    connection.status().clone(),
                    self.snapshot_period(),
                ));
                self.link.connection = Some(connection);
                self.link.last_error.clear();
            }
            Err(e) => {
                error!("Failed to start ingestion for {}: {}", serial.port, e);
                self.link.last_error = format!("Failed to connect: {}", e);
            }
        }
    }

    pub fn disconnect(&mut self) {
        if let Some(mut connection) = self.link.connection.take() {
            info!("User requested disconnect from {}", connection.name());
            connection.close();
        }
        self.link.consumer = None;
        self.render(&RenderFrame::Idle {
            status: PipelineStatus::Disconnected,
        });
    }

    /// 把当前端口写回配置文件
    pub fn save_settings(&mut self) -> Result<(), ConfigError> {
        let port = self.link.port_input.trim().to_string();
        let serial = &mut self.settings.get_config_mut().serial;
        serial.simulate = port == crate::serial::connection::SIMULATOR_PORT;
        if !serial.simulate {
            serial.port = port;
        }
        self.settings.save()?;
        info!("Settings saved to {}", self.settings.config_path().display());
        Ok(())
    }

    /// 按快照周期刷新当前帧
    pub fn refresh(&mut self, now: Instant) {
        let frame = self.link.consumer.as_mut().and_then(|c| c.poll(now));
        if let Some(frame) = frame {
            self.render(&frame);
        }
    }
}

impl Renderer for AppState {
    fn render(&mut self, frame: &RenderFrame) {
        self.frame = frame.clone();
    }
}

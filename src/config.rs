use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::store::DEFAULT_WINDOW_CAPACITY;

/// 模拟器允许的采样频率 (Hz)
pub const SIMULATED_RATE_RANGE: RangeInclusive<f64> = 0.001..=100_000.0;

/// 应用配置管理模块
/// 集中管理所有配置项，提供默认值和配置验证

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub serial: SerialConfig,
    pub pipeline: PipelineConfig,
    pub plot: PlotConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
    pub title: String,
    pub vsync: bool,
}

/// 串口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// 设备路径；"-" 表示标准输入，"sim" 表示内置模拟器
    pub port: String,
    pub baud_rate: u32,
    pub simulate: bool,
    pub simulated_rate_hz: f64,
    /// 模拟器输出坏行的比例 (0..=1)
    pub simulated_glitch_rate: f64,
    /// 固定随机种子；不设置时每次运行不同
    pub simulated_seed: Option<u64>,
    /// 输出指定行数后结束
    pub simulated_limit: Option<u64>,
}

/// 采集管线配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub window_capacity: usize,
    pub snapshot_period_ms: u64,
    /// 采集线程检查关闭信号的最长间隔
    pub poll_interval_ms: u64,
}

/// 绘图配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub plot_height: f32,
    pub show_gyroscope: bool,
    pub colors: PlotColors,
}

/// 绘图颜色配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotColors {
    pub x_axis: [u8; 3],
    pub y_axis: [u8; 3],
    pub z_axis: [u8; 3],
    pub gyro_x: [u8; 3],
    pub gyro_y: [u8; 3],
    pub gyro_z: [u8; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 800.0,
            title: "SerialScope - IMU Monitor".to_string(),
            vsync: true,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: if cfg!(windows) { "COM3" } else { "/dev/ttyACM0" }.to_string(),
            baud_rate: 9600,
            simulate: false,
            simulated_rate_hz: 50.0,
            simulated_glitch_rate: 0.0,
            simulated_seed: None,
            simulated_limit: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            snapshot_period_ms: 100,
            poll_interval_ms: 50,
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            plot_height: 100.0,
            show_gyroscope: true,
            colors: PlotColors::default(),
        }
    }
}

impl Default for PlotColors {
    fn default() -> Self {
        Self {
            x_axis: [255, 0, 0],    // 红色
            y_axis: [0, 160, 0],    // 绿色
            z_axis: [0, 0, 255],    // 蓝色
            gyro_x: [255, 140, 0],  // 橙色
            gyro_y: [0, 150, 150],  // 青色
            gyro_z: [128, 0, 128],  // 紫色
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        std::fs::write(path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width <= 0.0 || self.window.height <= 0.0 {
            return Err(ConfigError::ValidationError("Window dimensions must be positive".to_string()));
        }

        if self.pipeline.window_capacity == 0 {
            return Err(ConfigError::ValidationError("Window capacity must be positive".to_string()));
        }

        if self.pipeline.snapshot_period_ms == 0 {
            return Err(ConfigError::ValidationError("Snapshot period must be positive".to_string()));
        }

        if self.pipeline.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError("Poll interval must be positive".to_string()));
        }

        if self.serial.baud_rate == 0 {
            return Err(ConfigError::ValidationError("Baud rate must be positive".to_string()));
        }

        if !SIMULATED_RATE_RANGE.contains(&self.serial.simulated_rate_hz) {
            return Err(ConfigError::ValidationError(format!(
                "Simulated sample rate must be within {:?} Hz",
                SIMULATED_RATE_RANGE
            )));
        }

        if !(0.0..=1.0).contains(&self.serial.simulated_glitch_rate) {
            return Err(ConfigError::ValidationError("Simulated glitch rate must be within 0..=1".to_string()));
        }

        Ok(())
    }

    /// 用环境变量覆盖串口设置
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = std::env::var("SERIAL_PORT") {
            self.serial.port = port;
        }
        if let Ok(baud) = std::env::var("SERIAL_BAUD") {
            self.serial.baud_rate = baud
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("Invalid SERIAL_BAUD: {}", baud)))?;
        }
        self.validate()
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 配置管理器
pub struct ConfigManager {
    config: AppConfig,
    config_path: PathBuf,
}

impl ConfigManager {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = AppConfig::load_from_file(&path)?;
        Ok(Self {
            config,
            config_path: path.as_ref().to_path_buf(),
        })
    }

    /// 配置文件存在则加载，否则使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self {
                config: AppConfig::default(),
                config_path: path.as_ref().to_path_buf(),
            })
        }
    }

    /// 获取当前配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取可变配置
    pub fn get_config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 校验后写回配置文件
    pub fn save(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.config.save_to_file(&self.config_path)
    }
}

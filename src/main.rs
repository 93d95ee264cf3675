mod analysis;
mod app;
mod config;
mod consumer;
mod decoder;
mod logger;
mod plotter;
mod serial;
mod store;
mod types;

use std::env;
use std::error;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dotenv::dotenv;
use eframe::egui;
use log::{error, info};

use app::SensorScopeApp;
use config::{AppConfig, ConfigManager};
use consumer::{spawn_consumer, JsonLinesRenderer, SnapshotConsumer};
use serial::Connection;

const DEFAULT_CONFIG_PATH: &str = "serialscope.toml";

fn main() {
    logger::init_logger();
    dotenv().ok(); // 加载 .env 文件
    info!("Application starting");

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let headless = env::var("SCOPE_HEADLESS").is_ok_and(|v| v == "1" || v == "true");
    let result = if headless {
        run_headless(settings.get_config())
    } else {
        run_gui(settings)
    };

    if let Err(e) = result {
        error!("SerialScope failed: {}", e);
        std::process::exit(1);
    }
}

fn load_config() -> Result<ConfigManager, Box<dyn error::Error>> {
    let path = env::var("SCOPE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let mut manager = ConfigManager::load_or_default(&path)?;
    info!("Using configuration {}", manager.config_path().display());

    let config = manager.get_config_mut();
    config.apply_env_overrides()?;
    // 命令行第一个参数覆盖端口
    if let Some(port) = env::args().nth(1) {
        config.serial.port = port;
    }
    Ok(manager)
}

fn run_gui(settings: ConfigManager) -> Result<(), Box<dyn error::Error>> {
    let config = settings.get_config();
    let options = eframe::NativeOptions {
        vsync: config.window.vsync,
        renderer: eframe::Renderer::Glow,
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_resizable(true),
        ..Default::default()
    };

    let title = config.window.title.clone();
    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(SensorScopeApp::new(settings, true)))),
    )?;

    info!("GUI closed");
    Ok(())
}

/// 无界面模式：每个快照周期向 stdout 输出一行 JSON
fn run_headless(config: &AppConfig) -> Result<(), Box<dyn error::Error>> {
    let mut connection = Connection::open_configured(&config.serial, &config.pipeline)?;
    let shutdown = Arc::new(AtomicBool::new(false));

    let consumer = SnapshotConsumer::new(
        connection.store().clone(),
        connection.status().clone(),
        Duration::from_millis(config.pipeline.snapshot_period_ms),
    );
    let consumer_handle = spawn_consumer(consumer, JsonLinesRenderer::new(io::stdout()), Arc::clone(&shutdown))?;

    // 链路断开后退出
    while connection.is_running() {
        thread::sleep(Duration::from_millis(config.pipeline.poll_interval_ms));
    }
    connection.close();

    shutdown.store(true, Ordering::Relaxed);
    if consumer_handle.join().is_err() {
        error!("Snapshot consumer thread panicked");
    }

    info!(
        "Link {} closed: {} records accepted, {} dropped",
        connection.name(),
        connection.status().accepted(),
        connection.status().rejected()
    );
    Ok(())
}

use std::time::Instant;

use eframe::{egui, Frame};
use log::info;

use super::state::AppState;
use crate::config::ConfigManager;

pub struct SensorScopeApp {
    // 统一的状态管理
    pub state: AppState,
}

impl SensorScopeApp {
    pub fn new(settings: ConfigManager, auto_connect: bool) -> Self {
        let mut state = AppState::new(settings);
        if auto_connect {
            state.connect();
        }

        info!("应用启动，端口: {}", state.link.port_input);
        Self { state }
    }
}

impl eframe::App for SensorScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        // 设置明亮模式主题
        ctx.set_visuals(egui::Visuals::light());

        // 按快照周期获取最新一帧
        self.state.refresh(Instant::now());

        // 渲染UI组件
        crate::app::ui::render_status_bar(self, ctx);
        crate::app::ui::render_bottom_status_bar(self, ctx);
        crate::app::ui::render_main_panel(self, ctx);

        ctx.request_repaint_after(self.state.snapshot_period());
    }
}

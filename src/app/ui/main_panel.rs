use eframe::egui;

use crate::app::sensor_app::SensorScopeApp;
use crate::consumer::RenderFrame;
use crate::plotter::WaveformPlot;

pub fn render_main_panel(app: &mut SensorScopeApp, ctx: &egui::Context) {
    egui::CentralPanel::default().show(ctx, |ui| match &app.state.frame {
        RenderFrame::Live { snapshot, .. } if snapshot.is_empty() => {
            ui.centered_and_justified(|ui| {
                ui.label("Connected - waiting for the first record");
            });
        }
        RenderFrame::Live { snapshot, .. } => {
            WaveformPlot::ui(ui, snapshot, &app.state.config().plot);
        }
        RenderFrame::Idle { status } => {
            // 未连接时显示空闲界面
            ui.centered_and_justified(|ui| {
                ui.label(format!("{} - choose a port and press Connect", status));
            });
        }
    });
}

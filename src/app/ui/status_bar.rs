use eframe::egui;

use crate::analysis::{is_collision, Orientation};
use crate::app::sensor_app::SensorScopeApp;
use crate::consumer::RenderFrame;
use crate::types::{PipelineState, PipelineStatus};

pub fn render_status_bar(app: &mut SensorScopeApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("status_bar")
        .min_height(40.0)
        .show(ctx, |ui| {
            ui.add_space(5.0);
            ui.horizontal(|ui| {
                ui.label("Status:");

                let (status_text, status_color) = match app.state.pipeline_state() {
                    PipelineState::Idle => ("Idle", egui::Color32::from_rgb(120, 120, 120)), // 灰色
                    PipelineState::Connecting => ("Connecting", egui::Color32::from_rgb(255, 165, 0)), // 橙色
                    PipelineState::Connected => ("Connected", egui::Color32::from_rgb(0, 150, 0)), // 绿色
                    PipelineState::Disconnected => ("Disconnected", egui::Color32::from_rgb(150, 0, 0)), // 红色
                };
                ui.colored_label(status_color, status_text);

                ui.separator();

                // 端口输入框
                ui.label("Port:");
                let connected = matches!(
                    app.state.pipeline_state(),
                    PipelineState::Connecting | PipelineState::Connected
                );
                ui.add_enabled(
                    !connected,
                    egui::TextEdit::singleline(&mut app.state.link.port_input)
                        .desired_width(140.0)
                        .hint_text("/dev/ttyACM0, - or sim"),
                );
                ui.label(format!("{} baud", app.state.config().serial.baud_rate));

                // 重连由用户手动触发
                if connected {
                    if ui.button("⏹ Disconnect").clicked() {
                        app.state.disconnect();
                    }
                } else if ui.button("▶ Connect").clicked() {
                    app.state.connect();
                }

                if ui.button("💾 Save").on_hover_text("Save port to the config file").clicked() {
                    if let Err(e) = app.state.save_settings() {
                        app.state.link.last_error = format!("Failed to save settings: {}", e);
                    }
                }

                ui.separator();
                render_motion_details(&app.state.frame, ui);

                ui.separator();
                let period_ms = app.state.config().pipeline.snapshot_period_ms;
                match app.state.frame.snapshot() {
                    Some(snapshot) => ui.label(format!(
                        "Window: {}/{} samples @ {} ms",
                        snapshot.len(),
                        snapshot.capacity,
                        period_ms
                    )),
                    None => ui.label(format!("Window: - @ {} ms", period_ms)),
                };
            });
            ui.add_space(5.0);
        });
}

fn render_motion_details(frame: &RenderFrame, ui: &mut egui::Ui) {
    let Some(latest) = frame.snapshot().and_then(|s| s.latest()) else {
        ui.label("waiting for data...");
        return;
    };

    ui.label(format!("Orientation: {}", Orientation::classify(&latest).label()));
    // 三轴中最大的角速度
    let rate = latest.gyro().iter().fold(0.0_f64, |max, w| max.max(w.abs()));
    ui.label(format!("Rotation: {:.1} °/s", rate));
    if is_collision(&latest) {
        ui.colored_label(egui::Color32::from_rgb(220, 0, 0), "⚠ Collision");
    }
}

pub fn render_bottom_status_bar(app: &mut SensorScopeApp, ctx: &egui::Context) {
    egui::TopBottomPanel::bottom("bottom_status_bar")
        .min_height(25.0)
        .show(ctx, |ui| {
            ui.add_space(3.0);
            ui.horizontal(|ui| {
                // 左侧：管线状态
                let status = app.state.frame.status();
                let color = match status {
                    PipelineStatus::Connected => egui::Color32::from_rgb(0, 150, 100),
                    PipelineStatus::Disconnected => egui::Color32::from_rgb(120, 120, 120),
                    PipelineStatus::DecodeError(_) => egui::Color32::from_rgb(200, 100, 0),
                };
                ui.colored_label(color, status.to_string());

                if let RenderFrame::Live { accepted, rejected, .. } = &app.state.frame {
                    ui.separator();
                    ui.label(format!("Records: {} ok, {} dropped", accepted, rejected));
                }

                // 右侧：连接错误
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if !app.state.link.last_error.is_empty() {
                        ui.colored_label(egui::Color32::from_rgb(200, 0, 0), &app.state.link.last_error);
                    }
                });
            });
            ui.add_space(3.0);
        });
}

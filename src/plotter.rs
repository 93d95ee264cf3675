use egui::Color32;
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};

use crate::config::PlotConfig;
use crate::store::WindowSnapshot;
use crate::types::Channel;

/// 格式化数字为固定宽度的 y 轴标签
fn format_fixed_width_y_label(value: f64) -> String {
    let abs_value = value.abs();
    // 根据数值大小选择格式，全部固定为6字符宽度
    if abs_value >= 1000.0 {
        format!("{:-6.1e}", value)
    } else if abs_value >= 100.0 {
        format!("{:-6.0}", value)
    } else if abs_value >= 10.0 {
        format!("{:-6.1}", value)
    } else {
        format!("{:-6.2}", value)
    }
}

/// Y 轴范围：数据最小/最大值两侧各留 5%
fn y_range(values: &[f64]) -> (f64, f64) {
    let (y_min, y_max) = values.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(min, max), &val| (min.min(val), max.max(val)),
    );
    let range = (y_max - y_min).max(0.1);
    (y_min - range * 0.05, y_max + range * 0.05)
}

fn channel_color(channel: Channel, config: &PlotConfig) -> Color32 {
    let c = &config.colors;
    let rgb = match channel {
        Channel::AccelX => c.x_axis,
        Channel::AccelY => c.y_axis,
        Channel::AccelZ => c.z_axis,
        Channel::GyroX => c.gyro_x,
        Channel::GyroY => c.gyro_y,
        Channel::GyroZ => c.gyro_z,
    };
    Color32::from_rgb(rgb[0], rgb[1], rgb[2])
}

/// 绘制一帧快照中的六个通道
pub struct WaveformPlot;

impl WaveformPlot {
    pub fn ui(ui: &mut egui::Ui, snapshot: &WindowSnapshot, config: &PlotConfig) {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.vertical(|ui| {
                // 加速度计数据显示
                ui.heading("Accelerometer (g)");
                for channel in [Channel::AccelX, Channel::AccelY, Channel::AccelZ] {
                    Self::plot_channel(ui, snapshot, channel, config);
                }

                // 陀螺仪数据显示（可选）
                if config.show_gyroscope {
                    ui.separator();
                    ui.heading("Gyroscope (°/s)");
                    for channel in [Channel::GyroX, Channel::GyroY, Channel::GyroZ] {
                        Self::plot_channel(ui, snapshot, channel, config);
                    }
                }
            });
        });
    }

    fn plot_channel(ui: &mut egui::Ui, snapshot: &WindowSnapshot, channel: Channel, config: &PlotConfig) {
        let values = snapshot.channel(channel);
        let latest = values.last().copied().unwrap_or(0.0);
        ui.label(format!("{}: {:+.3} {}", channel.label(), latest, channel.unit()));

        if values.is_empty() {
            return;
        }

        let (y_min, y_max) = y_range(values);
        let capacity = snapshot.capacity as f64;
        let color = channel_color(channel, config);

        Plot::new(channel.label())
            .height(config.plot_height)
            .y_axis_formatter(|v, _| format_fixed_width_y_label(v.value))
            .show_x(false)
            .show_y(false)
            .allow_drag(false)
            .allow_zoom(false)
            .show(ui, |plot_ui| {
                // 最旧的数据在左侧，窗口未满时曲线右端对齐到最新位置
                let offset = capacity - values.len() as f64;
                let points: Vec<[f64; 2]> = values
                    .iter()
                    .enumerate()
                    .map(|(i, &y)| [offset + i as f64, y])
                    .collect();

                plot_ui.set_plot_bounds(PlotBounds::from_min_max([0.0, y_min], [capacity, y_max]));
                plot_ui.line(Line::new(channel.label(), PlotPoints::from(points)).color(color).width(1.0));
            });
    }
}

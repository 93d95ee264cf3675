use chrono::Local;
use env_logger::Builder;
use log::Level;
use std::io::Write;

/// 初始化日志，默认级别 info，可通过 RUST_LOG 覆盖
pub fn init_logger() {
    Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let time = Local::now().format("%H:%M:%S%.3f");
            let level_color = match record.level() {
                Level::Error => "\x1b[31m\x1b[1m", // 红色
                Level::Warn => "\x1b[33m\x1b[1m",  // 黄色
                Level::Info => "\x1b[32m\x1b[1m",  // 绿色
                Level::Debug => "\x1b[36m\x1b[1m", // 青色
                Level::Trace => "\x1b[90m\x1b[1m", // 灰色
            };
            // 采集线程和快照线程并行输出，带上线程名便于区分
            let thread = std::thread::current();
            writeln!(
                buf,
                "{}{} {:<5}\x1b[0m [{}] [{}:{}] {}",
                time,
                level_color,
                record.level(),
                thread.name().unwrap_or("?"),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args(),
            )
        })
        .init();
}

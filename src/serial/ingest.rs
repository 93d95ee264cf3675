use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, trace, warn};

use super::source::{LineEvent, LineSource, TransportError};
use crate::decoder::decode_record;
use crate::store::WindowStore;
use crate::types::StatusCell;

/// 采集循环正常退出的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestExit {
    EndOfStream,
    Cancelled,
}

/// 从 `source` 读取记录，直到链路结束、出错或 `shutdown` 被置位
///
/// 有效样本写入 `store`；坏行丢弃并通过 `status` 报告。任何退出路径上
/// 状态都会变为 `Disconnected`。链路错误返回给调用方，不重试。
pub fn run_ingestion<S: LineSource>(
    mut source: S,
    store: &WindowStore,
    status: &StatusCell,
    shutdown: &AtomicBool,
) -> Result<IngestExit, TransportError> {
    status.set_connected();

    let exit = loop {
        // 检查关闭信号
        if shutdown.load(Ordering::Relaxed) {
            info!("Ingestion received shutdown signal, exiting");
            break IngestExit::Cancelled;
        }

        match source.next_event() {
            Ok(LineEvent::Record(line)) => {
                if line.is_empty() {
                    continue;
                }
                match decode_record(&line) {
                    Ok(sample) => {
                        trace!("Accepted record: {}", line);
                        store.push(&sample);
                        status.record_accepted();
                    }
                    Err(e) => {
                        warn!("Invalid sensor record {:?}: {}", line, e);
                        status.report_decode_error(e.to_string());
                    }
                }
            }
            Ok(LineEvent::Idle) => {}
            Ok(LineEvent::EndOfStream) => {
                info!("Line source reached end of stream");
                break IngestExit::EndOfStream;
            }
            Err(e) => {
                error!("Serial link error: {}", e);
                status.set_disconnected();
                return Err(e);
            }
        }
    };

    status.set_disconnected();
    Ok(exit)
}

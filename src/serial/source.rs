use std::io::{self, BufRead, Read};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use log::{error, info};

/// 单行最多缓存的字节数，超过后按一行交给解码器
pub const MAX_LINE_BYTES: usize = 256;

/// 链路层错误，会结束当前连接
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),
    #[error("link unavailable: {0}")]
    Unavailable(String),
}

/// 一次读取的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// 去掉换行符和首尾空白后的一行
    Record(String),
    /// 轮询间隔内没有新数据
    Idle,
    EndOfStream,
}

/// 按行输出的文本数据源
///
/// `next_event` 可以阻塞，但必须在有限时间内返回；返回 [`LineEvent::Idle`]
/// 让调用方有机会检查关闭信号。
pub trait LineSource: Send {
    fn next_event(&mut self) -> Result<LineEvent, TransportError>;
}

/// 从任意带缓冲的字节流读取行（串口、抓包文件）
pub struct ReaderLineSource<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R: BufRead> ReaderLineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(MAX_LINE_BYTES),
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.buffer).trim().to_string();
        self.buffer.clear();
        line
    }
}

impl<R: BufRead + Send> LineSource for ReaderLineSource<R> {
    fn next_event(&mut self) -> Result<LineEvent, TransportError> {
        let limit = (MAX_LINE_BYTES - self.buffer.len()) as u64;
        let read = (&mut self.reader).take(limit).read_until(b'\n', &mut self.buffer);
        match read {
            Ok(0) => {
                // 流结束时丢弃未完成的半行
                self.buffer.clear();
                Ok(LineEvent::EndOfStream)
            }
            Ok(_) if self.buffer.last() == Some(&b'\n') => Ok(LineEvent::Record(self.take_line())),
            Ok(_) if self.buffer.len() >= MAX_LINE_BYTES => {
                // 一直没有换行符：整段交出去，由解码器判定为坏行
                Ok(LineEvent::Record(self.take_line()))
            }
            // 读到了数据但没有换行符：等待后续数据补齐这一行
            Ok(_) => Ok(LineEvent::Idle),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(LineEvent::Idle)
            }
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

/// 通过 channel 送来的行；所有发送端都被丢弃时流结束
pub struct ChannelLineSource {
    receiver: Receiver<String>,
    poll_interval: Duration,
}

impl ChannelLineSource {
    pub fn new(receiver: Receiver<String>, poll_interval: Duration) -> Self {
        Self {
            receiver,
            poll_interval,
        }
    }

    /// 在独立线程中读取标准输入
    ///
    /// stdin 的阻塞读无法打断，放到单独线程后采集循环仍能按轮询间隔
    /// 响应关闭；连接关闭后该线程在下一行到达或 EOF 时退出。
    pub fn stdin(poll_interval: Duration) -> Result<Self, TransportError> {
        let (tx, rx) = unbounded();
        thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let mut source = ReaderLineSource::new(io::BufReader::new(io::stdin()));
                loop {
                    match source.next_event() {
                        Ok(LineEvent::Record(line)) => {
                            if tx.send(line).is_err() {
                                break;
                            }
                        }
                        Ok(LineEvent::Idle) => {}
                        Ok(LineEvent::EndOfStream) => {
                            info!("stdin closed");
                            break;
                        }
                        Err(e) => {
                            error!("Failed to read stdin: {}", e);
                            break;
                        }
                    }
                }
            })?;
        Ok(Self::new(rx, poll_interval))
    }
}

impl LineSource for ChannelLineSource {
    fn next_event(&mut self) -> Result<LineEvent, TransportError> {
        match self.receiver.recv_timeout(self.poll_interval) {
            Ok(line) => Ok(LineEvent::Record(line.trim().to_string())),
            Err(RecvTimeoutError::Timeout) => Ok(LineEvent::Idle),
            Err(RecvTimeoutError::Disconnected) => Ok(LineEvent::EndOfStream),
        }
    }
}

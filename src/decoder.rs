//! 传感器文本行解码
//!
//! 一行由空白分隔的若干字段组成。第 1、3、5、7、9、11 个字段（从 0 开始）
//! 是原始读数（加速度 x/y/z、陀螺仪 x/y/z），其余字段是标签，忽略。
//! 读数末尾可以带一个 `:`，解析前去掉。
//!
//! ```text
//! X: 16384 Y: 0 Z: -16384 PSSI: 131 PHI: 0 RHO: -131
//! ```

use crate::types::{Sample, CHANNEL_COUNT};

/// 六个读数所在的字段位置，按通道顺序
pub const VALUE_POSITIONS: [usize; CHANNEL_COUNT] = [1, 3, 5, 7, 9, 11];
pub const MIN_TOKENS: usize = 12;

/// 无法解码为 [`Sample`] 的记录
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("empty record")]
    Empty,
    #[error("expected at least 12 tokens, found {found}")]
    TooFewTokens { found: usize },
    #[error("token {position} ({token:?}) is not an integer")]
    InvalidInteger { position: usize, token: String },
}

/// 解码一行；纯函数，不做 I/O，也不访问共享状态
pub fn decode_record(record: &str) -> Result<Sample, DecodeError> {
    let tokens: Vec<&str> = record.split_whitespace().collect();
    if tokens.is_empty() {
        return Err(DecodeError::Empty);
    }
    if tokens.len() < MIN_TOKENS {
        return Err(DecodeError::TooFewTokens {
            found: tokens.len(),
        });
    }

    let mut raw = [0i32; CHANNEL_COUNT];
    for (slot, &position) in raw.iter_mut().zip(VALUE_POSITIONS.iter()) {
        *slot = parse_reading(tokens[position]).ok_or_else(|| DecodeError::InvalidInteger {
            position,
            token: tokens[position].to_string(),
        })?;
    }

    Ok(Sample::from_raw(raw))
}

fn parse_reading(token: &str) -> Option<i32> {
    let digits = token.strip_suffix(':').unwrap_or(token);
    digits.parse::<i32>().ok()
}

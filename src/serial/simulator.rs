use std::f64::consts::TAU;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::source::{LineEvent, LineSource, TransportError};
use crate::config::SerialConfig;
use crate::types::sample::{ACCEL_SCALE, GYRO_SCALE};

/// 模拟 MPU6050 固件的串口输出，不需要硬件
pub struct SimulatedLineSource {
    rng: StdRng,
    period: Duration,
    poll_interval: Duration,
    next_due: Instant,
    emitted: u64,
    limit: Option<u64>,
    glitch_rate: f64,
}

impl SimulatedLineSource {
    pub fn new(rate_hz: f64, poll_interval: Duration) -> Result<Self, TransportError> {
        Self::with_rng(StdRng::from_os_rng(), rate_hz, poll_interval)
    }

    /// 固定随机种子，输出可复现
    pub fn seeded(seed: u64, rate_hz: f64, poll_interval: Duration) -> Result<Self, TransportError> {
        Self::with_rng(StdRng::seed_from_u64(seed), rate_hz, poll_interval)
    }

    /// 按串口配置中的模拟器参数创建
    pub fn from_config(serial: &SerialConfig, poll_interval: Duration) -> Result<Self, TransportError> {
        let source = match serial.simulated_seed {
            Some(seed) => Self::seeded(seed, serial.simulated_rate_hz, poll_interval)?,
            None => Self::new(serial.simulated_rate_hz, poll_interval)?,
        };
        let source = source.with_glitch_rate(serial.simulated_glitch_rate);
        Ok(match serial.simulated_limit {
            Some(limit) => source.with_limit(limit),
            None => source,
        })
    }

    fn with_rng(rng: StdRng, rate_hz: f64, poll_interval: Duration) -> Result<Self, TransportError> {
        // 频率过小、为零或非数字时周期无法表示
        let period = Duration::try_from_secs_f64(1.0 / rate_hz)
            .ok()
            .filter(|p| !p.is_zero())
            .ok_or_else(|| TransportError::Unavailable(format!("invalid simulated rate {} Hz", rate_hz)))?;

        Ok(Self {
            rng,
            period,
            poll_interval,
            next_due: Instant::now(),
            emitted: 0,
            limit: None,
            glitch_rate: 0.0,
        })
    }

    /// 输出 `limit` 行后结束
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 被截断（无法解码）的行所占比例
    pub fn with_glitch_rate(mut self, rate: f64) -> Self {
        self.glitch_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    fn next_line(&mut self) -> String {
        let t = self.emitted as f64 * self.period.as_secs_f64();
        // 缓慢绕 X 轴摆动，重力主要落在 Z 轴
        let tilt = 0.6 * (TAU * 0.1 * t).sin();
        let noise = |rng: &mut StdRng| rng.random_range(-0.02..0.02);

        let ax = noise(&mut self.rng);
        let ay = tilt.sin() + noise(&mut self.rng);
        let az = tilt.cos() + noise(&mut self.rng);
        let gx = (0.6 * TAU * 0.1 * (TAU * 0.1 * t).cos()).to_degrees() + noise(&mut self.rng);
        let gy = noise(&mut self.rng) * 50.0;
        let gz = noise(&mut self.rng) * 50.0;

        let raw_accel = |g: f64| (g * ACCEL_SCALE).round().clamp(-32768.0, 32767.0) as i32;
        let raw_gyro = |dps: f64| (dps * GYRO_SCALE).round().clamp(-32768.0, 32767.0) as i32;

        let line = format!(
            "X: {} Y: {} Z: {} PSSI: {} PHI: {} RHO: {}",
            raw_accel(ax),
            raw_accel(ay),
            raw_accel(az),
            raw_gyro(gx),
            raw_gyro(gy),
            raw_gyro(gz),
        );

        if self.glitch_rate > 0.0 && self.rng.random_bool(self.glitch_rate) {
            // 截断到最后一个数值之前，保证这一行解不出来
            let last_gap = line.rfind(' ').unwrap_or(0);
            let cut = self.rng.random_range(0..=last_gap);
            return line[..cut].to_string();
        }
        line
    }
}

impl LineSource for SimulatedLineSource {
    fn next_event(&mut self) -> Result<LineEvent, TransportError> {
        if self.limit.is_some_and(|limit| self.emitted >= limit) {
            return Ok(LineEvent::EndOfStream);
        }

        let now = Instant::now();
        if now < self.next_due {
            let wait = self.next_due - now;
            if wait > self.poll_interval {
                thread::sleep(self.poll_interval);
                return Ok(LineEvent::Idle);
            }
            thread::sleep(wait);
        }

        let line = self.next_line();
        self.emitted += 1;
        self.next_due += self.period;
        Ok(LineEvent::Record(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_record;

    #[test]
    fn emits_decodable_records_until_limit() {
        let mut source = SimulatedLineSource::seeded(7, 10_000.0, Duration::from_millis(10))
            .unwrap()
            .with_limit(50);
        let mut count = 0;
        loop {
            match source.next_event().unwrap() {
                LineEvent::Record(line) => {
                    let sample = decode_record(&line).unwrap();
                    assert!(sample.accel().iter().all(|v| v.abs() < 1.5));
                    count += 1;
                }
                LineEvent::Idle => {}
                LineEvent::EndOfStream => break,
            }
        }
        assert_eq!(count, 50);
    }

    #[test]
    fn glitched_records_fail_to_decode() {
        let mut source = SimulatedLineSource::seeded(3, 10_000.0, Duration::from_millis(10))
            .unwrap()
            .with_limit(20)
            .with_glitch_rate(1.0);
        let mut glitched = 0;
        loop {
            match source.next_event().unwrap() {
                LineEvent::Record(line) => {
                    assert!(decode_record(&line).is_err());
                    glitched += 1;
                }
                LineEvent::Idle => {}
                LineEvent::EndOfStream => break,
            }
        }
        assert_eq!(glitched, 20);
    }

    #[test]
    fn rejects_unrepresentable_rates() {
        let poll = Duration::from_millis(10);
        for rate in [1e-30, 0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(SimulatedLineSource::new(rate, poll), Err(TransportError::Unavailable(_))),
                "rate {} accepted",
                rate
            );
        }
        assert!(SimulatedLineSource::new(0.001, poll).is_ok());
    }

    #[test]
    fn config_drives_seed_limit_and_glitches() {
        let serial = SerialConfig {
            simulated_rate_hz: 10_000.0,
            simulated_seed: Some(11),
            simulated_limit: Some(5),
            simulated_glitch_rate: 1.0,
            ..SerialConfig::default()
        };
        let collect = || {
            let mut source = SimulatedLineSource::from_config(&serial, Duration::from_millis(10)).unwrap();
            let mut lines = Vec::new();
            loop {
                match source.next_event().unwrap() {
                    LineEvent::Record(line) => lines.push(line),
                    LineEvent::Idle => {}
                    LineEvent::EndOfStream => break,
                }
            }
            lines
        };

        let first = collect();
        assert_eq!(first.len(), 5);
        assert!(first.iter().all(|l| decode_record(l).is_err()));
        // 相同种子输出相同
        assert_eq!(first, collect());
    }
}

/// 加速度计原始值到 g 的换算系数 (MPU6050 ±2g 量程)
pub const ACCEL_SCALE: f64 = 16384.0;
/// 陀螺仪原始值到 °/s 的换算系数 (MPU6050 ±250°/s 量程)
pub const GYRO_SCALE: f64 = 131.0;

pub const CHANNEL_COUNT: usize = 6;

/// 六个测量通道，顺序与串口数据一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::AccelX,
        Channel::AccelY,
        Channel::AccelZ,
        Channel::GyroX,
        Channel::GyroY,
        Channel::GyroZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Channel::AccelX => "ACC X",
            Channel::AccelY => "ACC Y",
            Channel::AccelZ => "ACC Z",
            Channel::GyroX => "GYRO X",
            Channel::GyroY => "GYRO Y",
            Channel::GyroZ => "GYRO Z",
        }
    }

    pub fn unit(self) -> &'static str {
        if self.is_accel() {
            "g"
        } else {
            "°/s"
        }
    }

    pub fn scale(self) -> f64 {
        if self.is_accel() {
            ACCEL_SCALE
        } else {
            GYRO_SCALE
        }
    }

    pub fn is_accel(self) -> bool {
        matches!(self, Channel::AccelX | Channel::AccelY | Channel::AccelZ)
    }
}

/// 一次解码后的观测：三轴加速度 (g) 和三轴角速度 (°/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    values: [f64; CHANNEL_COUNT],
}

impl Sample {
    pub fn new(accel: [f64; 3], gyro: [f64; 3]) -> Self {
        Self {
            values: [accel[0], accel[1], accel[2], gyro[0], gyro[1], gyro[2]],
        }
    }

    /// 原始整数按通道换算为物理单位
    pub fn from_raw(raw: [i32; CHANNEL_COUNT]) -> Self {
        let mut values = [0.0; CHANNEL_COUNT];
        for channel in Channel::ALL {
            values[channel.index()] = raw[channel.index()] as f64 / channel.scale();
        }
        Self { values }
    }

    pub fn get(&self, channel: Channel) -> f64 {
        self.values[channel.index()]
    }

    pub fn accel(&self) -> [f64; 3] {
        [self.values[0], self.values[1], self.values[2]]
    }

    pub fn gyro(&self) -> [f64; 3] {
        [self.values[3], self.values[4], self.values[5]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_applies_per_channel_scale() {
        let sample = Sample::from_raw([16384, 0, -16384, 131, 0, -131]);
        assert_eq!(sample.accel(), [1.0, 0.0, -1.0]);
        assert_eq!(sample.gyro(), [1.0, 0.0, -1.0]);
    }

    #[test]
    fn channel_order_matches_values() {
        let sample = Sample::new([0.1, 0.2, 0.3], [4.0, 5.0, 6.0]);
        assert_eq!(sample.get(Channel::AccelY), 0.2);
        assert_eq!(sample.get(Channel::GyroZ), 6.0);
        assert!(Channel::AccelZ.is_accel());
        assert!(!Channel::GyroX.is_accel());
        assert_eq!(Channel::GyroX.unit(), "°/s");
    }
}

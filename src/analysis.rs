use crate::types::Sample;

/// 与重力方向对齐的判定区间 (g)
const ALIGNED_MIN: f64 = 0.8;
const ALIGNED_MAX: f64 = 1.1;
/// 碰撞阈值：0.15 g × 12 = 1.8 g
pub const COLLISION_THRESHOLD_G: f64 = 1.8;

/// 当前承受重力的加速度轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    XUp,
    YUp,
    ZUp,
    Unknown,
}

impl Orientation {
    /// 某轴读数绝对值在 0.8 g 到 1.1 g 之间、另外两轴都小于 0.8 g 时视为竖直
    pub fn classify(sample: &Sample) -> Self {
        let [x, y, z] = sample.accel().map(f64::abs);
        let aligned = |a: f64, b: f64, c: f64| {
            a > ALIGNED_MIN && a < ALIGNED_MAX && b < ALIGNED_MIN && c < ALIGNED_MIN
        };

        if aligned(x, y, z) {
            Orientation::XUp
        } else if aligned(y, x, z) {
            Orientation::YUp
        } else if aligned(z, x, y) {
            Orientation::ZUp
        } else {
            Orientation::Unknown
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Orientation::XUp => "X axis vertical",
            Orientation::YUp => "Y axis vertical",
            Orientation::ZUp => "Z axis vertical",
            Orientation::Unknown => "Tilted",
        }
    }
}

/// 任一轴加速度超过碰撞阈值
pub fn is_collision(sample: &Sample) -> bool {
    sample
        .accel()
        .iter()
        .any(|a| a.abs() > COLLISION_THRESHOLD_G)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accel(x: f64, y: f64, z: f64) -> Sample {
        Sample::new([x, y, z], [0.0, 0.0, 0.0])
    }

    #[test]
    fn classifies_resting_axes() {
        assert_eq!(Orientation::classify(&accel(0.0, 0.0, 1.0)), Orientation::ZUp);
        assert_eq!(Orientation::classify(&accel(-0.98, 0.1, 0.05)), Orientation::XUp);
        assert_eq!(Orientation::classify(&accel(0.2, 1.05, -0.3)), Orientation::YUp);
    }

    #[test]
    fn tilted_or_moving_is_unknown() {
        assert_eq!(Orientation::classify(&accel(0.7, 0.7, 0.0)), Orientation::Unknown);
        assert_eq!(Orientation::classify(&accel(0.0, 0.0, 1.2)), Orientation::Unknown);
        assert_eq!(Orientation::classify(&accel(0.9, 0.0, 0.85)), Orientation::Unknown);
    }

    #[test]
    fn detects_collision_on_any_axis() {
        assert!(!is_collision(&accel(0.0, 0.0, 1.0)));
        assert!(is_collision(&accel(0.0, -1.9, 1.0)));
        assert!(!is_collision(&accel(1.8, 0.0, 0.0)));
    }
}

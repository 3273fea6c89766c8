/// 相補フィルターによる姿勢推定
///
/// ジャイロの角速度積分（応答性は高いがドリフトする）と、
/// 加速度から求めた重力方向の角度（ノイズは多いがドリフトしない）を
/// 固定係数で混合します。ヨーは地磁気補正が無いため長時間でドリフトします。

use crate::lsm6ds3::Vector3;
use crate::STANDARD_GRAVITY;

/// ジャイロ側の重み（98% ジャイロ, 2% 加速度）
pub const DEFAULT_ALPHA: f32 = 0.98;
/// 初回更新時の経過時間（秒）
pub const FIRST_UPDATE_DT_S: f32 = 0.01;
/// これ以上の経過時間は停止・巻き戻りとみなす（秒）
pub const MAX_VALID_DT_S: f32 = 1.0;

/// 姿勢角（度）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// X軸回転
    pub roll: f32,
    /// Y軸回転
    pub pitch: f32,
    /// Z軸回転
    pub yaw: f32,
}

impl Orientation {
    /// 加速度（m/s²）から求めた瞬時の姿勢角
    pub fn from_accel(accel: Vector3) -> Self {
        let ax = accel.x / STANDARD_GRAVITY;
        let ay = accel.y / STANDARD_GRAVITY;
        let az = accel.z / STANDARD_GRAVITY;

        Self {
            roll: ay.atan2(az).to_degrees(),
            pitch: (-ax).atan2((ay * ay + az * az).sqrt()).to_degrees(),
            yaw: ay.atan2(ax).to_degrees(),
        }
    }
}

/// 軸ごとの相補フィルター
#[derive(Debug, Clone)]
pub struct ComplementaryFilter {
    alpha: f32,
    angles: Orientation,
    last_update_ms: Option<u64>,
}

impl Default for ComplementaryFilter {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl ComplementaryFilter {
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            angles: Orientation::default(),
            last_update_ms: None,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn angles(&self) -> Orientation {
        self.angles
    }

    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }

    /// 状態を初期化（ドライバー再初期化時のみ）
    pub fn reset(&mut self) {
        self.angles = Orientation::default();
        self.last_update_ms = None;
    }

    /// 新しい加速度・角速度で姿勢を更新
    ///
    /// `now_ms` は単調クロックの現在値。経過時間が0以下または1秒以上の場合は
    /// 積分せず加速度のみの推定値に置き換えます。
    pub fn update(&mut self, accel: Vector3, gyro: Vector3, now_ms: u64) -> Orientation {
        let dt = match self.last_update_ms {
            Some(last) => (now_ms as i64 - last as i64) as f32 / 1000.0,
            None => FIRST_UPDATE_DT_S,
        };
        self.last_update_ms = Some(now_ms);

        let measured = Orientation::from_accel(accel);

        if dt > 0.0 && dt < MAX_VALID_DT_S {
            let a = self.alpha;
            self.angles = Orientation {
                roll: a * (self.angles.roll + gyro.x * dt) + (1.0 - a) * measured.roll,
                pitch: a * (self.angles.pitch + gyro.y * dt) + (1.0 - a) * measured.pitch,
                yaw: a * (self.angles.yaw + gyro.z * dt) + (1.0 - a) * measured.yaw,
            };
        } else {
            self.angles = measured;
        }

        self.angles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gravity_on_y() -> Vector3 {
        Vector3::new(0.0, STANDARD_GRAVITY, 0.0)
    }

    #[test]
    fn test_from_accel_flat() {
        let o = Orientation::from_accel(Vector3::new(0.0, 0.0, STANDARD_GRAVITY));
        assert!(o.roll.abs() < 1e-4);
        assert!(o.pitch.abs() < 1e-4);
        assert!(o.yaw.abs() < 1e-4);
    }

    #[test]
    fn test_from_accel_gravity_on_y_is_90_roll() {
        let o = Orientation::from_accel(gravity_on_y());
        assert!((o.roll - 90.0).abs() < 1e-3);
        assert!(o.pitch.abs() < 1e-3);
        assert!((o.yaw - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_from_accel_gravity_on_negative_x_is_90_pitch() {
        let o = Orientation::from_accel(Vector3::new(-STANDARD_GRAVITY, 0.0, 0.0));
        assert!((o.pitch - 90.0).abs() < 1e-3);
    }

    #[test]
    fn test_first_update_blends_with_default_dt() {
        let mut filter = ComplementaryFilter::default();
        let o = filter.update(gravity_on_y(), Vector3::default(), 5_000);
        // 0.98 * (0 + 0) + 0.02 * 90
        assert!((o.roll - 1.8).abs() < 1e-3);
        assert_eq!(filter.last_update_ms(), Some(5_000));
    }

    #[test]
    fn test_converges_to_accel_angle_without_rotation() {
        let mut filter = ComplementaryFilter::default();
        let mut now = 0;
        let mut roll = 0.0;
        for _ in 0..500 {
            now += 10;
            roll = filter.update(gravity_on_y(), Vector3::default(), now).roll;
            // 定常帯域を超えない（オーバーシュートしない）
            assert!(roll <= 90.0 + 1e-3);
        }
        assert!((roll - 90.0).abs() < 0.05, "roll={}", roll);

        // 収束後はドリフトしない
        for _ in 0..500 {
            now += 10;
            let r = filter.update(gravity_on_y(), Vector3::default(), now).roll;
            assert!((r - 90.0).abs() < 0.05);
        }
    }

    #[test]
    fn test_integrates_gyro_rate() {
        let mut filter = ComplementaryFilter::new(1.0);
        filter.update(Vector3::new(0.0, 0.0, STANDARD_GRAVITY), Vector3::default(), 0);
        // 100°/s を 0.5 秒
        let o = filter.update(
            Vector3::new(0.0, 0.0, STANDARD_GRAVITY),
            Vector3::new(100.0, 0.0, 0.0),
            500,
        );
        assert!((o.roll - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_dt_falls_back_to_accel_estimate() {
        let mut filter = ComplementaryFilter::default();
        filter.update(Vector3::new(0.0, 0.0, STANDARD_GRAVITY), Vector3::new(500.0, 0.0, 0.0), 100);
        let o = filter.update(gravity_on_y(), Vector3::new(500.0, 0.0, 0.0), 100);
        assert_eq!(o, Orientation::from_accel(gravity_on_y()));
    }

    #[test]
    fn test_negative_dt_falls_back_to_accel_estimate() {
        let mut filter = ComplementaryFilter::default();
        filter.update(Vector3::new(0.0, 0.0, STANDARD_GRAVITY), Vector3::default(), 10_000);
        let o = filter.update(gravity_on_y(), Vector3::new(500.0, 500.0, 500.0), 9_000);
        assert_eq!(o, Orientation::from_accel(gravity_on_y()));
        assert_eq!(filter.last_update_ms(), Some(9_000));
    }

    #[test]
    fn test_stalled_dt_falls_back_to_accel_estimate() {
        let mut filter = ComplementaryFilter::default();
        filter.update(Vector3::new(0.0, 0.0, STANDARD_GRAVITY), Vector3::default(), 0);
        let o = filter.update(gravity_on_y(), Vector3::new(500.0, 0.0, 0.0), 1_000);
        assert_eq!(o, Orientation::from_accel(gravity_on_y()));
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = ComplementaryFilter::default();
        filter.update(gravity_on_y(), Vector3::default(), 10);
        filter.reset();
        assert_eq!(filter.angles(), Orientation::default());
        assert_eq!(filter.last_update_ms(), None);
    }
}

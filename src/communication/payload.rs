use serde::Serialize;

use crate::core::SensorTick;

/// 収集サーバーへ送るJSONの内容
///
/// フィールド名はサーバー側のスキーマに合わせています。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadingPayload {
    pub device_id: String,
    /// 起動からの秒数
    pub timestamp: u64,
    pub temperature: f32,
    pub humidity: f32,
    pub motion_magnitude: f32,
    pub motion_x: f32,
    pub motion_y: f32,
    pub motion_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
    pub angle_x: f32,
    pub angle_y: f32,
    pub angle_z: f32,
    pub sound: u16,
}

fn round_to(value: f32, decimals: i32) -> f32 {
    let factor = 10f32.powi(decimals);
    (value * factor).round() / factor
}

impl ReadingPayload {
    /// 計測結果からペイロードを作成（温湿度・角度は小数2桁、動きは3桁に丸める）
    pub fn from_tick(device_id: &str, tick: &SensorTick) -> Self {
        let motion = &tick.motion;
        Self {
            device_id: device_id.to_string(),
            timestamp: tick.timestamp_ms / 1000,
            temperature: round_to(tick.temperature(), 2),
            humidity: round_to(tick.humidity(), 2),
            motion_magnitude: round_to(motion.motion_magnitude, 3),
            motion_x: round_to(motion.accel.x, 3),
            motion_y: round_to(motion.accel.y, 3),
            motion_z: round_to(motion.accel.z, 3),
            gyro_x: round_to(motion.gyro.x, 3),
            gyro_y: round_to(motion.gyro.y, 3),
            gyro_z: round_to(motion.gyro.z, 3),
            angle_x: round_to(motion.orientation.roll, 2),
            angle_y: round_to(motion.orientation.pitch, 2),
            angle_z: round_to(motion.orientation.yaw, 2),
            sound: tick.sound_level,
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

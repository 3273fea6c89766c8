/*!
 * # 環境・モーションセンサードライバー
 *
 * I2Cバス上の温湿度センサー(HTS221)と6軸IMU(LSM6DS3)、
 * アナログマイクの音量キャリブレーションを提供するライブラリ
 *
 * ## モジュール構成
 * - `bus`: レジスタ単位のI2Cアクセス
 * - `hts221`: 温湿度センサー（工場校正値による線形補間 + 移動平均）
 * - `lsm6ds3`: 加速度・ジャイロセンサー（プローブ、生存確認、姿勢推定）
 * - `orientation`: 相補フィルターによる姿勢推定
 * - `sound`: 無音時ベースラインに基づく音量キャリブレーション
 *
 * バスや遅延はすべて `embedded-hal` のトレイト経由で受け取るため、
 * ホスト上のモックでもテストできます。
 */

pub mod bus;
pub mod error;
pub mod hts221;
pub mod lsm6ds3;
pub mod orientation;
pub mod smoothing;
pub mod sound;

pub use bus::RegisterBus;
pub use error::{SensorError, SensorResult};
pub use hts221::{CalibrationConstants, EnvironmentReading, Hts221};
pub use lsm6ds3::{Lsm6ds3, MotionConfig, MotionSample, OutputProfile, Vector3};
pub use orientation::{ComplementaryFilter, Orientation};
pub use smoothing::MovingAverage;
pub use sound::{AnalogInput, SoundBaseline, SoundCalibrator, SoundConfig};

/// 標準重力加速度 (m/s²)
pub const STANDARD_GRAVITY: f32 = 9.81;

/// 単調増加するミリ秒クロック
///
/// 姿勢推定の経過時間計算やアップロード間隔の判定に使用します。
pub trait MonotonicClock {
    fn now_ms(&self) -> u64;
}

/// ドライバーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// 未初期化（または初期化失敗後）
    Uninitialized,
    /// WHO_AM_I を確認中
    Probing,
    /// レジスタ設定済み、生存確認前
    Configured,
    /// 読み取り可能
    Ready,
    /// 直近の読み取りに失敗（致命的ではない）
    Degraded,
    /// 全アドレス・全プロファイルで失敗
    Failed,
}

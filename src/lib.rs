/*!
 * # センサーテレメトリノード
 *
 * 温湿度・モーション・音量を周期的に計測し、状態を判定して
 * 収集サーバーへHTTPで送信するファームウェアのライブラリ部分
 *
 * ## モジュール構成
 * - `config`: ビルド時設定（`cfg.toml`）の読み込みと検証
 * - `core`: センサー群の初期化と1ティック分の計測
 * - `communication`: 送信ペイロードとアップロードの間隔制御
 * - `platform`: ESP-IDF 上のADC・HTTP・Wi-Fi・コンソール（実機ビルドのみ）
 */

pub mod communication;
pub mod config;
pub mod core;

#[cfg(any(target_arch = "riscv32", target_arch = "xtensa"))]
pub mod platform;

pub use communication::{ReadingPayload, ReadingTransport, TransportError, UploadOutcome, Uploader};
pub use config::{AppConfig, ConfigChange, ConfigError};
pub use crate::core::{InitReport, SensorSuite, SensorTick};

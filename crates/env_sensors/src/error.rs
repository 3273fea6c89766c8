use core::fmt::Debug;

/// ドライバー操作の結果型
pub type SensorResult<T, E> = Result<T, SensorError<E>>;

/// センサードライバーのエラー
///
/// `E` はバス（またはADC）実装固有のエラー型です。
#[derive(Debug, thiserror::Error)]
pub enum SensorError<E: Debug> {
    /// バス/ADCとの通信エラー
    #[error("通信エラー: {0:?}")]
    Io(E),

    /// WHO_AM_I 不一致、またはデータが出力されない
    #[error("デバイスが見つかりません (アドレス: 0x{address:02X})")]
    DeviceNotFound { address: u8 },

    /// 校正値の2点が一致しており補間できない
    #[error("校正値が縮退しています: {0}")]
    DegenerateCalibration(&'static str),

    /// 初期化前に読み取りが要求された
    #[error("ドライバーが初期化されていません")]
    NotInitialized,
}

impl<E: Debug> SensorError<E> {
    pub fn is_device_not_found(&self) -> bool {
        matches!(self, SensorError::DeviceNotFound { .. })
    }
}

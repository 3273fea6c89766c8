use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::error::{SensorError, SensorResult};

/// 単発のアナログ値を返す入力 (0〜1023)
pub trait AnalogInput {
    type Error: Debug;

    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

/// 音量キャリブレーションの設定
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundConfig {
    /// ベースライン測定の外側サンプル数
    pub calibration_samples: u16,
    /// ベースライン測定の外側サンプル間隔
    pub calibration_interval_ms: u32,
    /// ベースライン測定時のピークツーピーク用バースト数
    pub calibration_burst: u16,
    /// 計測時のピークツーピーク用バースト数
    pub level_burst: u16,
    /// バースト内のサンプル間隔
    pub burst_interval_us: u32,
    /// ピークツーピーク差分の増幅率
    pub sensitivity: f32,
    /// 平滑化係数（前回値の重み）
    pub smoothing: f32,
}

impl Default for SoundConfig {
    fn default() -> Self {
        Self {
            calibration_samples: 30,
            calibration_interval_ms: 100,
            calibration_burst: 10,
            level_burst: 15,
            burst_interval_us: 100,
            sensitivity: 2.0,
            smoothing: 0.80,
        }
    }
}

/// 無音時ベースライン
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundBaseline {
    /// 平均値
    pub average: u16,
    /// 自然なばらつき（ピークツーピークの平均）
    pub peak_to_peak: u16,
}

/// マイク入力の音量キャリブレーター
///
/// 起動時に静かな環境でベースラインを測定し、以降はベースラインからの
/// 乖離（瞬時値）とピークツーピークの増分の大きい方を平滑化して返します。
pub struct SoundCalibrator<A> {
    input: A,
    config: SoundConfig,
    baseline: Option<SoundBaseline>,
    smoothed: f32,
}

impl<A: AnalogInput> SoundCalibrator<A> {
    pub fn new(input: A) -> Self {
        Self::with_config(input, SoundConfig::default())
    }

    pub fn with_config(input: A, config: SoundConfig) -> Self {
        Self {
            input,
            config,
            baseline: None,
            smoothed: 0.0,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }

    pub fn baseline(&self) -> Option<SoundBaseline> {
        self.baseline
    }

    pub fn config(&self) -> &SoundConfig {
        &self.config
    }

    /// 内部の入力を取り出す
    pub fn release(self) -> A {
        self.input
    }

    /// 無音時のベースラインを測定
    ///
    /// 外側サンプル数 × 間隔（既定では約3秒）ブロックします。
    pub fn calibrate<D: DelayNs>(&mut self, delay: &mut D) -> SensorResult<SoundBaseline, A::Error> {
        info!("🎤 音量センサー: ベースライン測定を開始します（静かにしてください）");

        let samples = self.config.calibration_samples.max(1);
        let mut sum_average: u32 = 0;
        let mut sum_peak: u32 = 0;

        for i in 0..samples {
            sum_average += self.input.read_raw().map_err(SensorError::Io)? as u32;
            sum_peak += self.peak_to_peak(delay, self.config.calibration_burst)? as u32;
            delay.delay_ms(self.config.calibration_interval_ms);

            if i % 10 == 0 {
                debug!("🎤 キャリブレーション中... {}%", i as u32 * 100 / samples as u32);
            }
        }

        let baseline = SoundBaseline {
            average: (sum_average / samples as u32) as u16,
            peak_to_peak: (sum_peak / samples as u32) as u16,
        };
        self.baseline = Some(baseline);
        self.smoothed = 0.0;

        info!(
            "🎤 ベースライン: 平均={} | 自然なばらつき={}",
            baseline.average, baseline.peak_to_peak
        );
        Ok(baseline)
    }

    /// 現在の音量（ベースラインからの相対値）
    ///
    /// 未キャリブレーションの場合は生の値をそのまま返します。
    pub fn level<D: DelayNs>(&mut self, delay: &mut D) -> SensorResult<u16, A::Error> {
        let Some(baseline) = self.baseline else {
            return self.input.read_raw().map_err(SensorError::Io);
        };

        let raw = self.input.read_raw().map_err(SensorError::Io)?;
        let average_diff = (raw as i32 - baseline.average as i32).unsigned_abs() as f32;

        let peak = self.peak_to_peak(delay, self.config.level_burst)?;
        let relative_peak = (peak as i32 - baseline.peak_to_peak as i32).max(0);
        let amplified_peak = (relative_peak as f32 * self.config.sensitivity).trunc();

        let combined = average_diff.max(amplified_peak);
        self.smoothed = self.config.smoothing * self.smoothed + (1.0 - self.config.smoothing) * combined;

        Ok(self.smoothed as u16)
    }

    fn peak_to_peak<D: DelayNs>(&mut self, delay: &mut D, burst: u16) -> SensorResult<u16, A::Error> {
        let mut min = u16::MAX;
        let mut max = u16::MIN;
        for _ in 0..burst {
            let reading = self.input.read_raw().map_err(SensorError::Io)?;
            min = min.min(reading);
            max = max.max(reading);
            delay.delay_us(self.config.burst_interval_us);
        }
        Ok(max.saturating_sub(min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantInput(u16);

    impl AnalogInput for ConstantInput {
        type Error = ();

        fn read_raw(&mut self) -> Result<u16, ()> {
            Ok(self.0)
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_uncalibrated_level_is_raw_passthrough() {
        let mut calibrator = SoundCalibrator::new(ConstantInput(512));
        assert!(!calibrator.is_calibrated());
        assert_eq!(calibrator.level(&mut NoDelay).unwrap(), 512);
    }

    #[test]
    fn test_constant_input_calibrates_to_silence() {
        let mut calibrator = SoundCalibrator::new(ConstantInput(300));
        let baseline = calibrator.calibrate(&mut NoDelay).unwrap();
        assert_eq!(baseline, SoundBaseline { average: 300, peak_to_peak: 0 });

        for _ in 0..20 {
            assert_eq!(calibrator.level(&mut NoDelay).unwrap(), 0);
        }
    }

    #[test]
    fn test_default_config() {
        let config = SoundConfig::default();
        assert_eq!(config.calibration_samples, 30);
        assert_eq!(config.calibration_burst, 10);
        assert_eq!(config.level_burst, 15);
        assert_eq!(config.sensitivity, 2.0);
        assert_eq!(config.smoothing, 0.80);
    }
}

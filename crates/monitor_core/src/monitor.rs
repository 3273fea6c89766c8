use log::{info, warn};

use crate::classifier::{
    ComfortStatus, MotionStatus, OverallStatus, SoundStatus, MOTION_ACTIVE_MAX, SOUND_HIGH_MAX,
};

/// 平滑化に使うサンプル数
pub const SMOOTHING_SAMPLES: usize = 10;
/// サンプリング間隔
pub const SAMPLE_INTERVAL_MS: u64 = 1_000;
/// 判定間隔
pub const ANALYSIS_INTERVAL_MS: u64 = 10_000;
/// 連続違反がこの回数に達したら警報
pub const ALERT_THRESHOLD_COUNT: u32 = 3;

/// 判定に使う1サンプル
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub temperature: f32,
    pub humidity: f32,
    pub motion_magnitude: f32,
    pub sound_level: f32,
    pub timestamp_ms: u64,
}

/// 直近2サンプル間の変化率（/秒）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Trends {
    pub temperature: f32,
    pub humidity: f32,
    pub motion: f32,
    pub sound: f32,
}

/// 判定結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisResult {
    pub smoothed: SensorSnapshot,
    pub sound_status: SoundStatus,
    pub sound_alert: bool,
    pub sound_violation_count: u32,
    pub motion_status: MotionStatus,
    pub motion_alert: bool,
    pub motion_violation_count: u32,
    pub temperature_status: ComfortStatus,
    pub humidity_status: ComfortStatus,
    pub environmental_alert: bool,
    pub overall: OverallStatus,
    pub trends: Trends,
}

/// センサー値の平滑化と連続違反による警報判定
#[derive(Debug, Clone)]
pub struct SensorMonitor {
    buffer: [Option<SensorSnapshot>; SMOOTHING_SAMPLES],
    index: usize,
    last_sample_ms: u64,
    last_analysis_ms: u64,
    sound_violations: u32,
    motion_violations: u32,
    trends: Trends,
}

impl Default for SensorMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorMonitor {
    pub fn new() -> Self {
        Self {
            buffer: [None; SMOOTHING_SAMPLES],
            index: 0,
            last_sample_ms: 0,
            last_analysis_ms: 0,
            sound_violations: 0,
            motion_violations: 0,
            trends: Trends::default(),
        }
    }

    /// サンプルを追加（前回の取り込みから1秒未満なら無視）
    ///
    /// 取り込んだ場合は `true` を返します。
    pub fn add_sample(&mut self, temperature: f32, humidity: f32, motion_magnitude: f32, sound_level: f32, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_sample_ms) < SAMPLE_INTERVAL_MS {
            return false;
        }

        self.buffer[self.index] = Some(SensorSnapshot {
            temperature,
            humidity,
            motion_magnitude,
            sound_level,
            timestamp_ms: now_ms,
        });
        self.index = (self.index + 1) % SMOOTHING_SAMPLES;
        self.last_sample_ms = now_ms;
        true
    }

    /// 取り込み済みサンプルの数
    pub fn sample_count(&self) -> usize {
        self.buffer.iter().flatten().count()
    }

    /// 取り込み済みサンプルの平均（サンプルが無ければ全て0）
    pub fn smoothed(&self, now_ms: u64) -> SensorSnapshot {
        let mut sum = SensorSnapshot::default();
        let mut count = 0usize;
        for s in self.buffer.iter().flatten() {
            sum.temperature += s.temperature;
            sum.humidity += s.humidity;
            sum.motion_magnitude += s.motion_magnitude;
            sum.sound_level += s.sound_level;
            count += 1;
        }

        if count == 0 {
            return SensorSnapshot::default();
        }

        let n = count as f32;
        SensorSnapshot {
            temperature: sum.temperature / n,
            humidity: sum.humidity / n,
            motion_magnitude: sum.motion_magnitude / n,
            sound_level: sum.sound_level / n,
            timestamp_ms: now_ms,
        }
    }

    fn update_trends(&mut self) {
        let current = self.buffer[(self.index + SMOOTHING_SAMPLES - 1) % SMOOTHING_SAMPLES];
        let previous = self.buffer[(self.index + SMOOTHING_SAMPLES - 2) % SMOOTHING_SAMPLES];
        let (Some(current), Some(previous)) = (current, previous) else {
            return;
        };

        let elapsed_ms = current.timestamp_ms.saturating_sub(previous.timestamp_ms);
        if elapsed_ms == 0 {
            return;
        }
        let seconds = elapsed_ms as f32 / 1000.0;
        self.trends = Trends {
            temperature: (current.temperature - previous.temperature) / seconds,
            humidity: (current.humidity - previous.humidity) / seconds,
            motion: (current.motion_magnitude - previous.motion_magnitude) / seconds,
            sound: (current.sound_level - previous.sound_level) / seconds,
        };
    }

    /// 判定を実行（前回から10秒未満なら `None`）
    pub fn analyze(&mut self, now_ms: u64) -> Option<AnalysisResult> {
        if now_ms.saturating_sub(self.last_analysis_ms) < ANALYSIS_INTERVAL_MS {
            return None;
        }
        self.last_analysis_ms = now_ms;

        let smoothed = self.smoothed(now_ms);
        self.update_trends();

        if smoothed.sound_level > SOUND_HIGH_MAX {
            self.sound_violations += 1;
        } else {
            self.sound_violations = 0;
        }
        if smoothed.motion_magnitude > MOTION_ACTIVE_MAX {
            self.motion_violations += 1;
        } else {
            self.motion_violations = 0;
        }

        let sound_alert = self.sound_violations >= ALERT_THRESHOLD_COUNT;
        let motion_alert = self.motion_violations >= ALERT_THRESHOLD_COUNT;
        let temperature_status = ComfortStatus::temperature(smoothed.temperature);
        let humidity_status = ComfortStatus::humidity(smoothed.humidity);
        let environmental_alert =
            temperature_status == ComfortStatus::Dangerous || humidity_status == ComfortStatus::Dangerous;

        let score = sound_alert as u8 + motion_alert as u8 + if environmental_alert { 2 } else { 0 };
        let overall = OverallStatus::from_score(score);

        if overall != OverallStatus::Normal {
            warn!(
                "⚠️ {} (音: {} / 動き: {} / 温度: {} / 湿度: {})",
                overall,
                SoundStatus::classify(smoothed.sound_level),
                MotionStatus::classify(smoothed.motion_magnitude),
                temperature_status,
                humidity_status
            );
        } else {
            info!("状態: {}", overall);
        }

        Some(AnalysisResult {
            smoothed,
            sound_status: SoundStatus::classify(smoothed.sound_level),
            sound_alert,
            sound_violation_count: self.sound_violations,
            motion_status: MotionStatus::classify(smoothed.motion_magnitude),
            motion_alert,
            motion_violation_count: self.motion_violations,
            temperature_status,
            humidity_status,
            environmental_alert,
            overall,
            trends: self.trends,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(monitor: &mut SensorMonitor, start_ms: u64, sound: f32, motion: f32) -> u64 {
        let mut now = start_ms;
        for _ in 0..SMOOTHING_SAMPLES {
            now += SAMPLE_INTERVAL_MS;
            monitor.add_sample(22.0, 50.0, motion, sound, now);
        }
        now
    }

    #[test]
    fn test_samples_are_rate_limited() {
        let mut monitor = SensorMonitor::new();
        assert!(!monitor.add_sample(20.0, 40.0, 0.0, 0.0, 500));
        assert!(monitor.add_sample(20.0, 40.0, 0.0, 0.0, 1_000));
        assert!(!monitor.add_sample(20.0, 40.0, 0.0, 0.0, 1_999));
        assert!(monitor.add_sample(20.0, 40.0, 0.0, 0.0, 2_000));
        assert_eq!(monitor.sample_count(), 2);
    }

    #[test]
    fn test_smoothed_ignores_empty_slots() {
        let mut monitor = SensorMonitor::new();
        monitor.add_sample(20.0, 40.0, 1.0, 10.0, 1_000);
        monitor.add_sample(22.0, 60.0, 3.0, 30.0, 2_000);
        let s = monitor.smoothed(2_000);
        assert_eq!(s.temperature, 21.0);
        assert_eq!(s.humidity, 50.0);
        assert_eq!(s.motion_magnitude, 2.0);
        assert_eq!(s.sound_level, 20.0);
    }

    #[test]
    fn test_smoothed_without_samples_is_zero() {
        let monitor = SensorMonitor::new();
        assert_eq!(monitor.smoothed(5_000), SensorSnapshot::default());
    }

    #[test]
    fn test_ring_keeps_latest_window() {
        let mut monitor = SensorMonitor::new();
        let mut now = 0;
        for i in 0..(SMOOTHING_SAMPLES * 2) {
            now += SAMPLE_INTERVAL_MS;
            monitor.add_sample(i as f32, 50.0, 0.0, 0.0, now);
        }
        assert_eq!(monitor.sample_count(), SMOOTHING_SAMPLES);
        // 10..19 の平均
        assert_eq!(monitor.smoothed(now).temperature, 14.5);
    }

    #[test]
    fn test_analysis_interval() {
        let mut monitor = SensorMonitor::new();
        assert!(monitor.analyze(9_999).is_none());
        assert!(monitor.analyze(10_000).is_some());
        assert!(monitor.analyze(15_000).is_none());
        assert!(monitor.analyze(20_000).is_some());
    }

    #[test]
    fn test_sound_alert_after_three_consecutive_violations() {
        let mut monitor = SensorMonitor::new();
        let mut now = fill(&mut monitor, 0, 150.0, 0.0);

        for expected in 1..=3u32 {
            now += ANALYSIS_INTERVAL_MS;
            let result = monitor.analyze(now).unwrap();
            assert_eq!(result.sound_status, SoundStatus::Dangerous);
            assert_eq!(result.sound_violation_count, expected);
            assert_eq!(result.sound_alert, expected >= 3);
        }

        let result = monitor.analyze(now + ANALYSIS_INTERVAL_MS).unwrap();
        assert!(result.sound_alert);
        assert_eq!(result.overall, OverallStatus::Warning);
    }

    #[test]
    fn test_violation_counter_resets() {
        let mut monitor = SensorMonitor::new();
        let mut now = fill(&mut monitor, 0, 0.0, 5.0);
        for _ in 0..2 {
            now += ANALYSIS_INTERVAL_MS;
            monitor.analyze(now);
        }

        now = fill(&mut monitor, now, 0.0, 0.2);
        now += ANALYSIS_INTERVAL_MS;
        let result = monitor.analyze(now).unwrap();
        assert_eq!(result.motion_violation_count, 0);
        assert!(!result.motion_alert);
        assert_eq!(result.motion_status, MotionStatus::Calm);
    }

    #[test]
    fn test_environment_alert_scores_two() {
        let mut monitor = SensorMonitor::new();
        let mut now = 0;
        for _ in 0..SMOOTHING_SAMPLES {
            now += SAMPLE_INTERVAL_MS;
            monitor.add_sample(35.0, 50.0, 0.0, 0.0, now);
        }
        let result = monitor.analyze(now).unwrap();
        assert_eq!(result.temperature_status, ComfortStatus::Dangerous);
        assert!(result.environmental_alert);
        assert_eq!(result.overall, OverallStatus::Alert);
    }

    #[test]
    fn test_all_alerts_are_critical() {
        let mut monitor = SensorMonitor::new();
        let mut now = 0;
        for _ in 0..SMOOTHING_SAMPLES {
            now += SAMPLE_INTERVAL_MS;
            monitor.add_sample(10.0, 95.0, 5.0, 200.0, now);
        }
        let mut result = None;
        for _ in 0..3 {
            now += ANALYSIS_INTERVAL_MS;
            result = monitor.analyze(now);
        }
        assert_eq!(result.unwrap().overall, OverallStatus::Critical);
    }

    #[test]
    fn test_trends_use_latest_two_samples() {
        let mut monitor = SensorMonitor::new();
        monitor.add_sample(20.0, 40.0, 0.0, 0.0, 1_000);
        monitor.add_sample(22.0, 44.0, 1.0, 10.0, 3_000);
        let result = monitor.analyze(10_000).unwrap();
        assert_eq!(result.trends.temperature, 1.0);
        assert_eq!(result.trends.humidity, 2.0);
        assert_eq!(result.trends.motion, 0.5);
        assert_eq!(result.trends.sound, 5.0);
    }
}

use core::fmt;

/// 値を取り込む最小間隔
pub const COLLECT_INTERVAL_MS: u64 = 500;
/// 表示フレームの出力間隔
pub const DISPLAY_INTERVAL_MS: u64 = 1_000;

/// 1秒ごとの表示内容
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayFrame {
    pub temperature: f32,
    pub humidity: f32,
    pub motion: f32,
    pub sound: f32,
    /// (X, Y, Z) 度。モーションセンサーが動作していない場合は `None`
    pub angles: Option<(f32, f32, f32)>,
    /// 平均に使ったサンプル数
    pub samples: u32,
}

impl fmt::Display for DisplayFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "温度: {:.2}°C | 湿度: {:.2}% | 動き: {:.3} m/s²",
            self.temperature, self.humidity, self.motion
        )?;
        if let Some((x, y, z)) = self.angles {
            write!(f, " | 角度: X={:.1}° Y={:.1}° Z={:.1}°", x, y, z)?;
        }
        write!(f, " | 音: {:.1}", self.sound)
    }
}

/// 表示用の平均値集計
#[derive(Debug, Clone, Default)]
pub struct DisplayAggregator {
    temperature_sum: f32,
    humidity_sum: f32,
    motion_sum: f32,
    sound_sum: f32,
    count: u32,
    last_collect_ms: u64,
    last_display_ms: u64,
}

impl DisplayAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 値を取り込む（前回から500ms未満なら無視）
    pub fn add(&mut self, temperature: f32, humidity: f32, motion: f32, sound: f32, now_ms: u64) {
        if now_ms.saturating_sub(self.last_collect_ms) < COLLECT_INTERVAL_MS {
            return;
        }
        self.temperature_sum += temperature;
        self.humidity_sum += humidity;
        self.motion_sum += motion;
        self.sound_sum += sound;
        self.count += 1;
        self.last_collect_ms = now_ms;
    }

    /// 表示間隔に達していればフレームを返し、集計をリセットする
    pub fn frame(&mut self, angles: Option<(f32, f32, f32)>, now_ms: u64) -> Option<DisplayFrame> {
        if now_ms.saturating_sub(self.last_display_ms) < DISPLAY_INTERVAL_MS {
            return None;
        }

        let average = |sum: f32| if self.count > 0 { sum / self.count as f32 } else { 0.0 };
        let frame = DisplayFrame {
            temperature: average(self.temperature_sum),
            humidity: average(self.humidity_sum),
            motion: average(self.motion_sum),
            sound: average(self.sound_sum),
            angles,
            samples: self.count,
        };

        self.temperature_sum = 0.0;
        self.humidity_sum = 0.0;
        self.motion_sum = 0.0;
        self.sound_sum = 0.0;
        self.count = 0;
        self.last_display_ms = now_ms;
        Some(frame)
    }
}

use core::fmt;

// 音量しきい値（ベースラインからの相対値）
pub const SOUND_SILENCE_MAX: f32 = 5.0;
pub const SOUND_LOW_MAX: f32 = 20.0;
pub const SOUND_MEDIUM_MAX: f32 = 50.0;
pub const SOUND_HIGH_MAX: f32 = 100.0;

// 動きの強さしきい値（重力補正後, m/s²）
pub const MOTION_CALM_MAX: f32 = 0.5;
pub const MOTION_NORMAL_MAX: f32 = 1.5;
pub const MOTION_ACTIVE_MAX: f32 = 3.0;

// 温度（℃）
pub const TEMP_COMFORTABLE: (f32, f32) = (18.0, 26.0);
pub const TEMP_UNCOMFORTABLE: (f32, f32) = (26.0, 30.0);

// 湿度（%）
pub const HUMIDITY_COMFORTABLE: (f32, f32) = (30.0, 70.0);
pub const HUMIDITY_UNCOMFORTABLE: (f32, f32) = (70.0, 85.0);

/// 音量の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundStatus {
    Silence,
    Low,
    Medium,
    High,
    Dangerous,
}

impl SoundStatus {
    pub fn classify(level: f32) -> Self {
        if level <= SOUND_SILENCE_MAX {
            Self::Silence
        } else if level <= SOUND_LOW_MAX {
            Self::Low
        } else if level <= SOUND_MEDIUM_MAX {
            Self::Medium
        } else if level <= SOUND_HIGH_MAX {
            Self::High
        } else {
            Self::Dangerous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Silence => "SILENCE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Dangerous => "DANGEROUS",
        }
    }
}

/// 動きの強さの判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStatus {
    Calm,
    Normal,
    Active,
    Violent,
}

impl MotionStatus {
    pub fn classify(magnitude: f32) -> Self {
        if magnitude <= MOTION_CALM_MAX {
            Self::Calm
        } else if magnitude <= MOTION_NORMAL_MAX {
            Self::Normal
        } else if magnitude <= MOTION_ACTIVE_MAX {
            Self::Active
        } else {
            Self::Violent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Calm => "CALM",
            Self::Normal => "NORMAL",
            Self::Active => "ACTIVE",
            Self::Violent => "VIOLENT",
        }
    }
}

/// 温度・湿度の快適性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComfortStatus {
    Comfortable,
    Uncomfortable,
    Dangerous,
}

impl ComfortStatus {
    /// 両端を含む2つの範囲で判定（範囲外は `Dangerous`）
    fn classify(value: f32, comfortable: (f32, f32), uncomfortable: (f32, f32)) -> Self {
        if value >= comfortable.0 && value <= comfortable.1 {
            Self::Comfortable
        } else if value >= uncomfortable.0 && value <= uncomfortable.1 {
            Self::Uncomfortable
        } else {
            Self::Dangerous
        }
    }

    pub fn temperature(celsius: f32) -> Self {
        Self::classify(celsius, TEMP_COMFORTABLE, TEMP_UNCOMFORTABLE)
    }

    pub fn humidity(percent: f32) -> Self {
        Self::classify(percent, HUMIDITY_COMFORTABLE, HUMIDITY_UNCOMFORTABLE)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Comfortable => "COMFORTABLE",
            Self::Uncomfortable => "UNCOMFORTABLE",
            Self::Dangerous => "DANGEROUS",
        }
    }
}

/// 総合判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverallStatus {
    Normal,
    Warning,
    Alert,
    Critical,
}

impl OverallStatus {
    /// 警報スコア（音1 + 動き1 + 環境2）から判定
    pub fn from_score(score: u8) -> Self {
        match score {
            0 => Self::Normal,
            1 => Self::Warning,
            2 => Self::Alert,
            _ => Self::Critical,
        }
    }

    /// 0=Normal 〜 3=Critical
    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Alert => "ALERT",
            Self::Critical => "CRITICAL",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(SoundStatus, MotionStatus, ComfortStatus, OverallStatus);

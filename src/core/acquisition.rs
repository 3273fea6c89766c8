use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use env_sensors::{
    AnalogInput, EnvironmentReading, Hts221, Lsm6ds3, MotionConfig, MotionSample, RegisterBus,
    SoundCalibrator,
};
use log::{error, info, warn};

/// 起動時の初期化結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitReport {
    pub environment_ok: bool,
    pub motion_ok: bool,
    pub sound_calibrated: bool,
}

impl InitReport {
    /// I2Cセンサーが1つも使えない
    pub fn no_i2c_sensor(&self) -> bool {
        !self.environment_ok && !self.motion_ok
    }
}

/// 1ティック分の計測結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorTick {
    /// 計測時刻（起動からのミリ秒）
    pub timestamp_ms: u64,
    /// HTS221 が使えない場合は `None`
    pub environment: Option<EnvironmentReading>,
    pub motion: MotionSample,
    pub sound_level: u16,
}

impl SensorTick {
    /// 温度（℃）。センサーが無い場合は0
    pub fn temperature(&self) -> f32 {
        self.environment.map_or(0.0, |e| e.temperature_celsius)
    }

    /// 湿度（%）。センサーが無い場合は0
    pub fn humidity(&self) -> f32 {
        self.environment.map_or(0.0, |e| e.humidity_percent)
    }

    /// 表示用の姿勢角 (X, Y, Z)。モーションセンサーが動作していない場合は `None`
    pub fn angles(&self) -> Option<(f32, f32, f32)> {
        let o = self.motion.orientation;
        self.motion.sensor_working.then_some((o.roll, o.pitch, o.yaw))
    }
}

/// I2Cバスとセンサー群をまとめて所有する
///
/// バスは各ドライバー呼び出しに `&mut` で貸し出すため、
/// 同時アクセスはコンパイル時に排除されます。
pub struct SensorSuite<I2C, A> {
    bus: RegisterBus<I2C>,
    environment: Hts221,
    motion: Lsm6ds3,
    sound: SoundCalibrator<A>,
    last_environment: Option<EnvironmentReading>,
}

impl<I2C: I2c, A: AnalogInput> SensorSuite<I2C, A> {
    pub fn new(i2c: I2C, microphone: A, motion_config: MotionConfig) -> Self {
        Self::with_calibrator(i2c, SoundCalibrator::new(microphone), motion_config)
    }

    pub fn with_calibrator(i2c: I2C, sound: SoundCalibrator<A>, motion_config: MotionConfig) -> Self {
        Self {
            bus: RegisterBus::new(i2c),
            environment: Hts221::default(),
            motion: Lsm6ds3::new(motion_config),
            sound,
            last_environment: None,
        }
    }

    pub fn environment(&self) -> &Hts221 {
        &self.environment
    }

    pub fn motion(&self) -> &Lsm6ds3 {
        &self.motion
    }

    pub fn sound(&self) -> &SoundCalibrator<A> {
        &self.sound
    }

    /// 全センサーを初期化し、マイクのキャリブレーションを行う
    ///
    /// 個々のセンサーの失敗は致命的ではなく、結果に記録して続行します。
    pub fn initialize<D: DelayNs>(&mut self, delay: &mut D) -> InitReport {
        info!("センサーを初期化中...");

        let environment_ok = match self.environment.initialize(&mut self.bus, delay) {
            Ok(()) => true,
            Err(e) => {
                warn!("温湿度センサーは使用できません: {}", e);
                false
            }
        };

        let motion_ok = match self.motion.initialize(&mut self.bus, delay) {
            Ok(()) => true,
            Err(e) => {
                warn!("モーションセンサーは使用できません（代替値を使用）: {}", e);
                false
            }
        };

        info!("マイクをキャリブレーション中... 静かにしてください");
        let sound_calibrated = match self.sound.calibrate(delay) {
            Ok(baseline) => {
                info!(
                    "✓ マイクのキャリブレーション完了 (平均: {}, 振幅: {})",
                    baseline.average, baseline.peak_to_peak
                );
                true
            }
            Err(e) => {
                warn!("マイクのキャリブレーションに失敗（生の値を使用）: {}", e);
                false
            }
        };

        let report = InitReport {
            environment_ok,
            motion_ok,
            sound_calibrated,
        };
        info!(
            "初期化結果: HTS221={}, LSM6DS3={}, マイク={}",
            ok_mark(report.environment_ok),
            ok_mark(report.motion_ok),
            ok_mark(report.sound_calibrated)
        );
        if report.no_i2c_sensor() {
            error!("I2Cセンサーが1つも見つかりません。配線を確認してください");
        }
        report
    }

    /// 3つのセンサーを順に読み取る
    ///
    /// 読み取りエラーはこのティックだけ代替値で置き換え、次のティックで再試行します。
    pub fn tick<D: DelayNs>(&mut self, delay: &mut D, now_ms: u64) -> SensorTick {
        let environment = if self.environment.is_available() {
            match self.environment.read(&mut self.bus) {
                Ok(reading) => {
                    self.last_environment = Some(reading);
                    Some(reading)
                }
                // 前回値を使う（ドライバー側で警告済み）
                Err(_) => self.last_environment.map(|r| EnvironmentReading { is_fresh: false, ..r }),
            }
        } else {
            None
        };

        let motion = if self.motion.is_available() {
            self.motion
                .read(&mut self.bus, now_ms)
                .unwrap_or_else(|_| MotionSample::fallback())
        } else {
            MotionSample::fallback()
        };

        let sound_level = match self.sound.level(delay) {
            Ok(level) => level,
            Err(e) => {
                warn!("マイク読み取りエラー: {}", e);
                0
            }
        };

        SensorTick {
            timestamp_ms: now_ms,
            environment,
            motion,
            sound_level,
        }
    }
}

fn ok_mark(ok: bool) -> &'static str {
    if ok {
        "OK"
    } else {
        "NG"
    }
}

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, error, info, warn};

use crate::bus::RegisterBus;
use crate::error::{SensorError, SensorResult};
use crate::orientation::{ComplementaryFilter, Orientation};
use crate::{DriverState, STANDARD_GRAVITY};

/// 標準のI2Cアドレス (SA0 = Low)
pub const LSM6DS3_PRIMARY_ADDRESS: u8 = 0x6A;
/// 代替I2Cアドレス (SA0 = High)
pub const LSM6DS3_SECONDARY_ADDRESS: u8 = 0x6B;
/// 受け入れる WHO_AM_I 値 (LSM6DS3 / LSM6DSL 系)
pub const ACCEPTED_DEVICE_IDS: [u8; 2] = [0x69, 0x6A];

// レジスタマップ
pub const WHO_AM_I: u8 = 0x0F;
pub const CTRL1_XL: u8 = 0x10;
pub const CTRL2_G: u8 = 0x11;
pub const CTRL3_C: u8 = 0x12;
pub const OUTX_L_G: u8 = 0x22;
pub const OUTX_L_XL: u8 = 0x28;

const CTRL3_SW_RESET: u8 = 0x01;
const CTRL3_IF_INC: u8 = 0x04;
const CTRL3_BDU: u8 = 0x40;

/// ±2g レンジの感度 (mg/LSB)
pub const ACCEL_SENSITIVITY_MG_PER_LSB: f32 = 0.061;
/// ±245dps レンジの感度 (mdps/LSB)
pub const GYRO_SENSITIVITY_MDPS_PER_LSB: f32 = 8.75;
/// 重力補正後の加速度がこれを超えたら「動いている」とみなす (m/s²)
pub const MOTION_THRESHOLD_MS2: f32 = 0.1;

/// 3軸ベクトル
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// リトルエンディアンの i16 x3 を `scale` 倍して変換
    pub fn from_le_bytes(raw: &[u8; 6], scale: f32) -> Self {
        Self {
            x: i16::from_le_bytes([raw[0], raw[1]]) as f32 * scale,
            y: i16::from_le_bytes([raw[2], raw[3]]) as f32 * scale,
            z: i16::from_le_bytes([raw[4], raw[5]]) as f32 * scale,
        }
    }
}

/// 加速度・ジャイロの出力設定（CTRL1_XL / CTRL2_G の値）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputProfile {
    pub accel_ctrl: u8,
    pub gyro_ctrl: u8,
}

impl OutputProfile {
    /// 104Hz, ±2g / 104Hz, ±245dps
    pub const DEFAULT: Self = Self {
        accel_ctrl: 0x50,
        gyro_ctrl: 0x50,
    };
    /// 416Hz, ±2g / 416Hz, ±245dps（データが出てこない個体向け）
    pub const HIGH_RATE: Self = Self {
        accel_ctrl: 0x60,
        gyro_ctrl: 0x60,
    };
}

/// モーションドライバーの初期化パラメータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionConfig {
    pub primary_address: u8,
    pub secondary_address: u8,
    /// 標準アドレスでの WHO_AM_I 確認回数
    pub probe_attempts: u8,
    pub probe_interval_ms: u32,
    pub reset_delay_ms: u32,
    pub register_delay_ms: u32,
    pub stabilization_delay_ms: u32,
    /// 生存確認（非ゼロ出力）の回数
    pub liveness_attempts: u8,
    pub liveness_interval_ms: u32,
    pub primary_profile: OutputProfile,
    pub fallback_profile: OutputProfile,
    /// 相補フィルターのジャイロ側の重み
    pub filter_alpha: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            primary_address: LSM6DS3_PRIMARY_ADDRESS,
            secondary_address: LSM6DS3_SECONDARY_ADDRESS,
            probe_attempts: 3,
            probe_interval_ms: 100,
            reset_delay_ms: 200,
            register_delay_ms: 100,
            stabilization_delay_ms: 1000,
            liveness_attempts: 5,
            liveness_interval_ms: 500,
            primary_profile: OutputProfile::DEFAULT,
            fallback_profile: OutputProfile::HIGH_RATE,
            filter_alpha: crate::orientation::DEFAULT_ALPHA,
        }
    }
}

/// 1ティック分のモーションデータ
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    /// 加速度 (m/s²)
    pub accel: Vector3,
    /// 角速度 (°/s)
    pub gyro: Vector3,
    /// 重力補正後の加速度の大きさ (m/s²)
    pub motion_magnitude: f32,
    /// 姿勢角（度）
    pub orientation: Orientation,
    pub is_moving: bool,
    pub sensor_working: bool,
}

impl MotionSample {
    /// 生の加速度・角速度から派生値を計算（姿勢は呼び出し側で設定）
    pub fn from_measurements(accel: Vector3, gyro: Vector3) -> Self {
        let motion_magnitude = gravity_compensated_magnitude(accel);
        Self {
            accel,
            gyro,
            motion_magnitude,
            orientation: Orientation::default(),
            is_moving: motion_magnitude > MOTION_THRESHOLD_MS2,
            sensor_working: true,
        }
    }

    /// センサーが使えない場合の代替値（重力のみ、動きなし）
    pub fn fallback() -> Self {
        Self {
            accel: Vector3::new(0.0, 0.0, STANDARD_GRAVITY),
            gyro: Vector3::default(),
            motion_magnitude: 0.0,
            orientation: Orientation::default(),
            is_moving: false,
            sensor_working: false,
        }
    }
}

/// Z軸を鉛直とみなして重力成分を除いた加速度の大きさ
pub fn gravity_compensated_magnitude(accel: Vector3) -> f32 {
    Vector3::new(accel.x, accel.y, accel.z - STANDARD_GRAVITY).norm()
}

/// LSM6DS3 加速度・ジャイロセンサードライバー
pub struct Lsm6ds3 {
    config: MotionConfig,
    address: u8,
    state: DriverState,
    filter: ComplementaryFilter,
}

impl Default for Lsm6ds3 {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

impl Lsm6ds3 {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            address: config.primary_address,
            state: DriverState::Uninitialized,
            filter: ComplementaryFilter::new(config.filter_alpha),
            config,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// 現在使用中のI2Cアドレス
    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, DriverState::Ready | DriverState::Degraded)
    }

    pub fn orientation(&self) -> Orientation {
        self.filter.angles()
    }

    /// プローブ・リセット・設定・生存確認を順に行う
    pub fn initialize<I2C: I2c, D: DelayNs>(
        &mut self,
        bus: &mut RegisterBus<I2C>,
        delay: &mut D,
    ) -> SensorResult<(), I2C::Error> {
        info!("LSM6DS3を初期化中...");
        self.state = DriverState::Probing;
        self.filter.reset();

        self.address = match self.probe(bus, delay) {
            Some(address) => address,
            None => {
                error!(
                    "LSM6DS3: デバイスが見つかりません (0x{:02X}, 0x{:02X} ともに失敗)",
                    self.config.primary_address, self.config.secondary_address
                );
                self.state = DriverState::Failed;
                return Err(SensorError::DeviceNotFound {
                    address: self.config.secondary_address,
                });
            }
        };

        if let Err(e) = self.configure(bus, delay) {
            self.state = DriverState::Failed;
            return Err(e);
        }
        self.state = DriverState::Configured;
        delay.delay_ms(self.config.stabilization_delay_ms);

        let alive = self
            .check_liveness(bus, delay, self.config.liveness_attempts)
            .map_err(|e| self.fail(e))?;

        if !alive {
            warn!("LSM6DS3: データが出力されません。代替プロファイルで再試行します");
            self.apply_profile(bus, delay, self.config.fallback_profile)
                .map_err(|e| self.fail(e))?;
            delay.delay_ms(self.config.stabilization_delay_ms);

            let alive = self.check_liveness(bus, delay, 1).map_err(|e| self.fail(e))?;
            if !alive {
                error!("LSM6DS3: 代替プロファイルでもデータなし - ハードウェア異常の可能性");
                self.state = DriverState::Failed;
                return Err(SensorError::DeviceNotFound { address: self.address });
            }
        }

        self.state = DriverState::Ready;
        info!("✓ LSM6DS3の初期化に成功 (アドレス: 0x{:02X})", self.address);
        Ok(())
    }

    fn fail<E: core::fmt::Debug>(&mut self, e: E) -> SensorError<E> {
        self.state = DriverState::Failed;
        SensorError::Io(e)
    }

    /// WHO_AM_I を標準アドレスで最大 `probe_attempts` 回、代替アドレスで1回確認
    ///
    /// 応答しないアドレス（NACK）は不一致として扱います。
    fn probe<I2C: I2c, D: DelayNs>(&mut self, bus: &mut RegisterBus<I2C>, delay: &mut D) -> Option<u8> {
        let primary = self.config.primary_address;
        for attempt in 1..=self.config.probe_attempts {
            if Self::identify(bus, primary, attempt) {
                return Some(primary);
            }
            if attempt < self.config.probe_attempts {
                delay.delay_ms(self.config.probe_interval_ms);
            }
        }

        let secondary = self.config.secondary_address;
        warn!("LSM6DS3: 代替アドレス 0x{:02X} を試行します", secondary);
        Self::identify(bus, secondary, 1).then_some(secondary)
    }

    fn identify<I2C: I2c>(bus: &mut RegisterBus<I2C>, address: u8, attempt: u8) -> bool {
        match bus.read_register(address, WHO_AM_I) {
            Ok(id) => {
                debug!("LSM6DS3: 試行{} (0x{:02X}) - WHO_AM_I = 0x{:02X}", attempt, address, id);
                ACCEPTED_DEVICE_IDS.contains(&id)
            }
            Err(e) => {
                debug!("LSM6DS3: 試行{} (0x{:02X}) - 応答なし: {:?}", attempt, address, e);
                false
            }
        }
    }

    fn configure<I2C: I2c, D: DelayNs>(
        &mut self,
        bus: &mut RegisterBus<I2C>,
        delay: &mut D,
    ) -> SensorResult<(), I2C::Error> {
        debug!("LSM6DS3: ソフトウェアリセット");
        bus.write_register(self.address, CTRL3_C, CTRL3_SW_RESET)
            .map_err(SensorError::Io)?;
        delay.delay_ms(self.config.reset_delay_ms);
        let reset_status = bus.read_register(self.address, CTRL3_C).map_err(SensorError::Io)?;
        debug!("LSM6DS3: リセット後 CTRL3_C = 0x{:02X}", reset_status);

        self.apply_profile(bus, delay, self.config.primary_profile)
            .map_err(SensorError::Io)?;

        let ctrl1 = bus.read_register(self.address, CTRL1_XL).map_err(SensorError::Io)?;
        let ctrl2 = bus.read_register(self.address, CTRL2_G).map_err(SensorError::Io)?;
        let ctrl3 = bus.read_register(self.address, CTRL3_C).map_err(SensorError::Io)?;
        debug!(
            "LSM6DS3: CTRL1_XL=0x{:02X}, CTRL2_G=0x{:02X}, CTRL3_C=0x{:02X}",
            ctrl1, ctrl2, ctrl3
        );
        Ok(())
    }

    fn apply_profile<I2C: I2c, D: DelayNs>(
        &self,
        bus: &mut RegisterBus<I2C>,
        delay: &mut D,
        profile: OutputProfile,
    ) -> Result<(), I2C::Error> {
        bus.write_register(self.address, CTRL1_XL, profile.accel_ctrl)?;
        delay.delay_ms(self.config.register_delay_ms);
        bus.write_register(self.address, CTRL2_G, profile.gyro_ctrl)?;
        delay.delay_ms(self.config.register_delay_ms);
        bus.write_register(self.address, CTRL3_C, CTRL3_BDU | CTRL3_IF_INC)?;
        delay.delay_ms(self.config.register_delay_ms);
        Ok(())
    }

    /// 加速度出力レジスタに非ゼロのバイトが現れるまで最大 `attempts` 回確認
    fn check_liveness<I2C: I2c, D: DelayNs>(
        &self,
        bus: &mut RegisterBus<I2C>,
        delay: &mut D,
        attempts: u8,
    ) -> Result<bool, I2C::Error> {
        for attempt in 1..=attempts {
            let mut raw = [0u8; 6];
            bus.read_registers(self.address, OUTX_L_XL, &mut raw)?;
            debug!("LSM6DS3: 生存確認 {}/{} - {:02X?}", attempt, attempts, raw);

            if raw.iter().any(|&b| b != 0) {
                return Ok(true);
            }
            if attempt < attempts {
                delay.delay_ms(self.config.liveness_interval_ms);
            }
        }
        Ok(false)
    }

    /// 加速度・角速度を読み取り、姿勢を更新する
    pub fn read<I2C: I2c>(
        &mut self,
        bus: &mut RegisterBus<I2C>,
        now_ms: u64,
    ) -> SensorResult<MotionSample, I2C::Error> {
        if !self.is_available() {
            return Err(SensorError::NotInitialized);
        }

        let mut accel_raw = [0u8; 6];
        let mut gyro_raw = [0u8; 6];
        let result = bus
            .read_registers(self.address, OUTX_L_XL, &mut accel_raw)
            .and_then(|_| bus.read_registers(self.address, OUTX_L_G, &mut gyro_raw));
        if let Err(e) = result {
            warn!("LSM6DS3: 読み取りエラー: {:?}", e);
            self.state = DriverState::Degraded;
            return Err(SensorError::Io(e));
        }
        self.state = DriverState::Ready;

        let accel = Vector3::from_le_bytes(&accel_raw, ACCEL_SENSITIVITY_MG_PER_LSB * 0.001 * STANDARD_GRAVITY);
        let gyro = Vector3::from_le_bytes(&gyro_raw, GYRO_SENSITIVITY_MDPS_PER_LSB * 0.001);

        let mut sample = MotionSample::from_measurements(accel, gyro);
        sample.orientation = self.filter.update(accel, gyro, now_ms);
        Ok(sample)
    }
}

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::bus::RegisterBus;
use crate::error::{SensorError, SensorResult};
use crate::smoothing::MovingAverage;
use crate::DriverState;

/// HTS221 の I2C アドレス
pub const HTS221_ADDRESS: u8 = 0x5F;
/// WHO_AM_I の期待値
pub const HTS221_DEVICE_ID: u8 = 0xBC;

// レジスタマップ
pub const WHO_AM_I: u8 = 0x0F;
pub const CTRL_REG1: u8 = 0x20;
pub const STATUS_REG: u8 = 0x27;
pub const HUMIDITY_OUT_L: u8 = 0x28;
pub const HUMIDITY_OUT_H: u8 = 0x29;
pub const TEMP_OUT_L: u8 = 0x2A;
pub const TEMP_OUT_H: u8 = 0x2B;
pub const CALIB_H0_RH_X2: u8 = 0x30;
pub const CALIB_H1_RH_X2: u8 = 0x31;
pub const CALIB_T0_DEGC_X8: u8 = 0x32;
pub const CALIB_T1_DEGC_X8: u8 = 0x33;
pub const CALIB_T1_T0_MSB: u8 = 0x35;
pub const CALIB_H0_T0_OUT_L: u8 = 0x36;
pub const CALIB_H0_T0_OUT_H: u8 = 0x37;
pub const CALIB_H1_T0_OUT_L: u8 = 0x3A;
pub const CALIB_H1_T0_OUT_H: u8 = 0x3B;
pub const CALIB_T0_OUT_L: u8 = 0x3C;
pub const CALIB_T0_OUT_H: u8 = 0x3D;
pub const CALIB_T1_OUT_L: u8 = 0x3E;
pub const CALIB_T1_OUT_H: u8 = 0x3F;

/// PD=1, BDU=1, ODR=1Hz
const CTRL_REG1_ACTIVE: u8 = 0x85;
/// STATUS_REG の H_DA | T_DA
const STATUS_DATA_READY: u8 = 0x03;
const STABILIZATION_DELAY_MS: u32 = 100;
const SMOOTHING_WINDOW: usize = 5;

/// 工場校正値（初期化時に一度だけ読み取り、以降は不変）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationConstants {
    pub t0_deg_c: f32,
    pub t1_deg_c: f32,
    pub t0_out: i16,
    pub t1_out: i16,
    pub h0_rh: f32,
    pub h1_rh: f32,
    pub h0_t0_out: i16,
    pub h1_t0_out: i16,
}

impl CalibrationConstants {
    /// 温度校正値をデコード
    ///
    /// T0/T1 は x8 の10bit値で、上位2bitずつが `t1_t0_msb` にまとめて格納されています。
    pub fn decode_temperature_refs(t0_x8: u8, t1_x8: u8, t1_t0_msb: u8) -> (f32, f32) {
        let t0 = (((t1_t0_msb & 0x03) as u16) << 8) | t0_x8 as u16;
        let t1 = (((t1_t0_msb & 0x0C) as u16) << 6) | t1_x8 as u16;
        (t0 as f32 / 8.0, t1 as f32 / 8.0)
    }

    /// 湿度校正値（x2の8bit値）をデコード
    pub fn decode_humidity_ref(h_x2: u8) -> f32 {
        h_x2 as f32 / 2.0
    }

    /// 補間の分母が0にならないことを確認
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.t1_out == self.t0_out {
            return Err("T0_OUT と T1_OUT が同一");
        }
        if self.h1_t0_out == self.h0_t0_out {
            return Err("H0_T0_OUT と H1_T0_OUT が同一");
        }
        Ok(())
    }

    /// 生の温度コードを℃に変換
    pub fn temperature(&self, raw: i16) -> f32 {
        interpolate(raw, self.t0_out, self.t1_out, self.t0_deg_c, self.t1_deg_c)
    }

    /// 生の湿度コードを%rHに変換（0〜100にクランプ）
    pub fn humidity(&self, raw: i16) -> f32 {
        interpolate(raw, self.h0_t0_out, self.h1_t0_out, self.h0_rh, self.h1_rh).clamp(0.0, 100.0)
    }
}

fn interpolate(raw: i16, raw0: i16, raw1: i16, ref0: f32, ref1: f32) -> f32 {
    let span = (raw1 as i32 - raw0 as i32) as f32;
    ref0 + (raw as i32 - raw0 as i32) as f32 * (ref1 - ref0) / span
}

/// 温湿度の読み取り結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentReading {
    /// 平滑化済み温度（℃）
    pub temperature_celsius: f32,
    /// 平滑化済み相対湿度（%）
    pub humidity_percent: f32,
    /// 今回の読み取りで新しいサンプルを取り込んだか
    pub is_fresh: bool,
}

/// HTS221 温湿度センサードライバー
pub struct Hts221 {
    address: u8,
    state: DriverState,
    calibration: Option<CalibrationConstants>,
    temperature_filter: MovingAverage<SMOOTHING_WINDOW>,
    humidity_filter: MovingAverage<SMOOTHING_WINDOW>,
    last: Option<(f32, f32)>,
}

impl Default for Hts221 {
    fn default() -> Self {
        Self::new(HTS221_ADDRESS)
    }
}

impl Hts221 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            state: DriverState::Uninitialized,
            calibration: None,
            temperature_filter: MovingAverage::seeded(0.0),
            humidity_filter: MovingAverage::seeded(0.0),
            last: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, DriverState::Ready | DriverState::Degraded)
    }

    pub fn calibration(&self) -> Option<&CalibrationConstants> {
        self.calibration.as_ref()
    }

    /// センサーを初期化し、校正値を読み込む
    pub fn initialize<I2C: I2c, D: DelayNs>(
        &mut self,
        bus: &mut RegisterBus<I2C>,
        delay: &mut D,
    ) -> SensorResult<(), I2C::Error> {
        info!("HTS221を初期化中... (アドレス: 0x{:02X})", self.address);

        match bus.read_register(self.address, WHO_AM_I) {
            Ok(HTS221_DEVICE_ID) => {}
            Ok(who_am_i) => {
                warn!(
                    "HTS221: デバイスが見つかりません (WHO_AM_I=0x{:02X}, 期待値=0x{:02X})",
                    who_am_i, HTS221_DEVICE_ID
                );
                self.state = DriverState::Uninitialized;
                return Err(SensorError::DeviceNotFound { address: self.address });
            }
            Err(e) => {
                warn!("HTS221: 応答なし: {:?}", e);
                self.state = DriverState::Uninitialized;
                return Err(SensorError::DeviceNotFound { address: self.address });
            }
        }

        bus.write_register(self.address, CTRL_REG1, CTRL_REG1_ACTIVE)
            .map_err(SensorError::Io)?;
        delay.delay_ms(STABILIZATION_DELAY_MS);

        let calibration = self.read_calibration(bus).map_err(SensorError::Io)?;
        if let Err(reason) = calibration.validate() {
            warn!("HTS221: 校正値が不正です: {}", reason);
            self.state = DriverState::Uninitialized;
            return Err(SensorError::DegenerateCalibration(reason));
        }
        debug!("HTS221 校正値: {:?}", calibration);

        self.temperature_filter.reseed(calibration.t0_deg_c);
        self.humidity_filter.reseed(calibration.h0_rh);
        self.last = Some((calibration.t0_deg_c, calibration.h0_rh));
        self.calibration = Some(calibration);
        self.state = DriverState::Ready;

        info!("✓ HTS221の初期化に成功");
        Ok(())
    }

    fn read_calibration<I2C: I2c>(
        &self,
        bus: &mut RegisterBus<I2C>,
    ) -> Result<CalibrationConstants, I2C::Error> {
        let addr = self.address;
        let t0_x8 = bus.read_register(addr, CALIB_T0_DEGC_X8)?;
        let t1_x8 = bus.read_register(addr, CALIB_T1_DEGC_X8)?;
        let msb = bus.read_register(addr, CALIB_T1_T0_MSB)?;
        let (t0_deg_c, t1_deg_c) = CalibrationConstants::decode_temperature_refs(t0_x8, t1_x8, msb);

        Ok(CalibrationConstants {
            t0_deg_c,
            t1_deg_c,
            t0_out: bus.read_i16(addr, CALIB_T0_OUT_L, CALIB_T0_OUT_H)?,
            t1_out: bus.read_i16(addr, CALIB_T1_OUT_L, CALIB_T1_OUT_H)?,
            h0_rh: CalibrationConstants::decode_humidity_ref(bus.read_register(addr, CALIB_H0_RH_X2)?),
            h1_rh: CalibrationConstants::decode_humidity_ref(bus.read_register(addr, CALIB_H1_RH_X2)?),
            h0_t0_out: bus.read_i16(addr, CALIB_H0_T0_OUT_L, CALIB_H0_T0_OUT_H)?,
            h1_t0_out: bus.read_i16(addr, CALIB_H1_T0_OUT_L, CALIB_H1_T0_OUT_H)?,
        })
    }

    /// 温湿度を読み取る
    ///
    /// 新しいサンプルが無い場合は前回値をそのまま返します（`is_fresh == false`）。
    /// バスエラー時は `Degraded` に遷移してエラーを返し、次回の成功で `Ready` に戻ります。
    pub fn read<I2C: I2c>(&mut self, bus: &mut RegisterBus<I2C>) -> SensorResult<EnvironmentReading, I2C::Error> {
        let calibration = match self.calibration {
            Some(c) if self.is_available() => c,
            _ => return Err(SensorError::NotInitialized),
        };

        match self.read_raw(bus) {
            Ok(None) => {
                debug!("HTS221: 新しいサンプルなし、前回値を維持");
                self.state = DriverState::Ready;
                let (temperature_celsius, humidity_percent) = self.last_values(&calibration);
                Ok(EnvironmentReading {
                    temperature_celsius,
                    humidity_percent,
                    is_fresh: false,
                })
            }
            Ok(Some((temp_raw, hum_raw))) => {
                self.state = DriverState::Ready;
                let temperature = self.temperature_filter.push(calibration.temperature(temp_raw));
                let humidity = self.humidity_filter.push(calibration.humidity(hum_raw));
                self.last = Some((temperature, humidity));
                Ok(EnvironmentReading {
                    temperature_celsius: temperature,
                    humidity_percent: humidity,
                    is_fresh: true,
                })
            }
            Err(e) => {
                warn!("HTS221: 読み取りエラー: {:?}", e);
                self.state = DriverState::Degraded;
                Err(SensorError::Io(e))
            }
        }
    }

    fn read_raw<I2C: I2c>(&self, bus: &mut RegisterBus<I2C>) -> Result<Option<(i16, i16)>, I2C::Error> {
        let status = bus.read_register(self.address, STATUS_REG)?;
        if status & STATUS_DATA_READY == 0 {
            return Ok(None);
        }
        let temp_raw = bus.read_i16(self.address, TEMP_OUT_L, TEMP_OUT_H)?;
        let hum_raw = bus.read_i16(self.address, HUMIDITY_OUT_L, HUMIDITY_OUT_H)?;
        Ok(Some((temp_raw, hum_raw)))
    }

    fn last_values(&self, calibration: &CalibrationConstants) -> (f32, f32) {
        self.last.unwrap_or((calibration.t0_deg_c, calibration.h0_rh))
    }
}

//! テスト用のモック（センサーボード全体を模擬するI2Cバスとマイク）

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use env_sensors::AnalogInput;

pub const HTS221: u8 = 0x5F;
pub const LSM6DS3: u8 = 0x6A;

#[derive(Debug, Default)]
struct BoardState {
    devices: HashMap<u8, [u8; 256]>,
    fail_all: bool,
}

/// レジスタマップを持つI2Cバス（自動インクリメント、未登録アドレスは NACK）
#[derive(Debug, Clone, Default)]
pub struct FakeBoard {
    state: Arc<Mutex<BoardState>>,
}

impl FakeBoard {
    /// HTS221 (T0=20℃/raw 1000, T1=40℃/raw 3000, H0=20%/raw 0, H1=80%/raw 6000)
    /// と平置きの LSM6DS3 を載せたボード
    pub fn with_all_sensors() -> Self {
        let board = Self::default();
        board.add_hts221();
        board.add_lsm6ds3();
        board
    }

    pub fn add_hts221(&self) {
        self.set_registers(HTS221, 0x0F, &[0xBC]);
        self.set_registers(HTS221, 0x30, &[40, 160, 160, 0x40]);
        self.set_registers(HTS221, 0x35, &[0x04]);
        self.set_registers(HTS221, 0x36, &0i16.to_le_bytes());
        self.set_registers(HTS221, 0x3A, &6000i16.to_le_bytes());
        self.set_registers(HTS221, 0x3C, &1000i16.to_le_bytes());
        self.set_registers(HTS221, 0x3E, &3000i16.to_le_bytes());
    }

    pub fn add_lsm6ds3(&self) {
        self.set_registers(LSM6DS3, 0x0F, &[0x69]);
        // 1g = 16393 LSB (0x4009) をZ軸に
        self.set_registers(LSM6DS3, 0x28, &[0, 0, 0, 0, 0x09, 0x40]);
    }

    /// HTS221 に新しいサンプルを用意する
    pub fn set_environment_raw(&self, temp_raw: i16, hum_raw: i16) {
        self.set_registers(HTS221, 0x28, &hum_raw.to_le_bytes());
        self.set_registers(HTS221, 0x2A, &temp_raw.to_le_bytes());
        self.set_registers(HTS221, 0x27, &[0x03]);
    }

    pub fn set_registers(&self, address: u8, start: u8, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let regs = state.devices.entry(address).or_insert([0u8; 256]);
        for (i, &b) in data.iter().enumerate() {
            regs[start.wrapping_add(i as u8) as usize] = b;
        }
    }

    pub fn set_fail_all(&self, enable: bool) {
        self.state.lock().unwrap().fail_all = enable;
    }
}

impl ErrorType for FakeBoard {
    type Error = ErrorKind;
}

impl I2c for FakeBoard {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_all {
            return Err(ErrorKind::Bus);
        }
        let Some(regs) = state.devices.get_mut(&address) else {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        };

        let mut pointer = 0u8;
        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let Some((&register, data)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = register;
                    for &value in data {
                        regs[pointer as usize] = value;
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = regs[pointer as usize];
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

/// 実際には待たない遅延
#[derive(Debug, Default)]
pub struct NoopDelay;

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Debug)]
pub struct MicFault;

/// 値を外部から差し替えられるマイク
#[derive(Debug, Clone)]
pub struct SharedMic {
    pub value: Arc<Mutex<u16>>,
    pub fail: Arc<Mutex<bool>>,
}

impl SharedMic {
    pub fn new(value: u16) -> Self {
        Self {
            value: Arc::new(Mutex::new(value)),
            fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn set(&self, value: u16) {
        *self.value.lock().unwrap() = value;
    }

    pub fn set_fail(&self, enable: bool) {
        *self.fail.lock().unwrap() = enable;
    }
}

impl AnalogInput for SharedMic {
    type Error = MicFault;

    fn read_raw(&mut self) -> Result<u16, Self::Error> {
        if *self.fail.lock().unwrap() {
            return Err(MicFault);
        }
        Ok(*self.value.lock().unwrap())
    }
}

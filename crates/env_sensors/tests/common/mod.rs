//! テスト用のモック（レジスタマップ付きI2Cバス、遅延、アナログ入力）

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use env_sensors::AnalogInput;

/// 書き込みをきっかけにレジスタ内容を差し替えるルール
#[derive(Debug, Clone)]
struct WriteTrigger {
    address: u8,
    register: u8,
    value: u8,
    start: u8,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct BusState {
    devices: HashMap<u8, [u8; 256]>,
    pointers: HashMap<u8, u8>,
    triggers: Vec<WriteTrigger>,
    /// (アドレス, レジスタ, 値)
    writes: Vec<(u8, u8, u8)>,
    /// (アドレス, 先頭レジスタ, バイト数)
    reads: Vec<(u8, u8, usize)>,
    fail_all: bool,
}

/// テスト用のレジスタマップI2Cバス
///
/// デバイスごとに256バイトのレジスタ空間を持ち、アドレス自動インクリメントで読み書きします。
/// 登録されていないアドレスへのアクセスは NACK になります。
#[derive(Debug, Clone, Default)]
pub struct FakeI2cBus {
    state: Arc<Mutex<BusState>>,
}

impl FakeI2cBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用: デバイスを追加（全レジスタ0）
    pub fn add_device(&self, address: u8) {
        self.state.lock().unwrap().devices.insert(address, [0u8; 256]);
    }

    /// テスト用: レジスタ値を設定
    pub fn set_register(&self, address: u8, register: u8, value: u8) {
        self.set_registers(address, register, &[value]);
    }

    /// テスト用: 連続するレジスタ値を設定
    pub fn set_registers(&self, address: u8, start: u8, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        let regs = state.devices.entry(address).or_insert([0u8; 256]);
        for (i, &b) in data.iter().enumerate() {
            regs[start.wrapping_add(i as u8) as usize] = b;
        }
    }

    /// テスト用: レジスタ値を取得
    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.state.lock().unwrap().devices[&address][register as usize]
    }

    /// テスト用: `register` に `value` が書き込まれたら `start` 以降を `data` で上書き
    pub fn on_write(&self, address: u8, register: u8, value: u8, start: u8, data: &[u8]) {
        self.state.lock().unwrap().triggers.push(WriteTrigger {
            address,
            register,
            value,
            start,
            data: data.to_vec(),
        });
    }

    /// テスト用: すべての転送をエラーにする
    pub fn set_fail_all(&self, enable: bool) {
        self.state.lock().unwrap().fail_all = enable;
    }

    /// テスト用: 書き込み履歴
    pub fn writes(&self) -> Vec<(u8, u8, u8)> {
        self.state.lock().unwrap().writes.clone()
    }

    /// テスト用: 指定アドレス・レジスタからの読み取り回数（応答なしも含む）
    pub fn read_count(&self, address: u8, register: u8) -> usize {
        self.state
            .lock()
            .unwrap()
            .reads
            .iter()
            .filter(|(a, r, _)| *a == address && *r == register)
            .count()
    }
}

impl ErrorType for FakeI2cBus {
    type Error = ErrorKind;
}

impl I2c for FakeI2cBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        let mut state = self.state.lock().unwrap();
        let state = &mut *state;

        if state.fail_all {
            return Err(ErrorKind::Bus);
        }

        let present = state.devices.contains_key(&address);
        let mut pointer = state.pointers.get(&address).copied().unwrap_or(0);

        for op in operations.iter_mut() {
            match op {
                Operation::Write(bytes) => {
                    let Some((&register, data)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = register;
                    if !present {
                        // 先頭レジスタだけは履歴に残す（プローブ回数の確認用）
                        state.reads.push((address, register, 0));
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    }
                    for &value in data {
                        state.writes.push((address, pointer, value));
                        if let Some(regs) = state.devices.get_mut(&address) {
                            regs[pointer as usize] = value;
                        }
                        for trigger in state.triggers.iter() {
                            if trigger.address == address && trigger.register == pointer && trigger.value == value {
                                if let Some(regs) = state.devices.get_mut(&address) {
                                    for (i, &b) in trigger.data.iter().enumerate() {
                                        regs[trigger.start.wrapping_add(i as u8) as usize] = b;
                                    }
                                }
                            }
                        }
                        pointer = pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buf) => {
                    state.reads.push((address, pointer, buf.len()));
                    let Some(regs) = state.devices.get(&address) else {
                        return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
                    };
                    for b in buf.iter_mut() {
                        *b = regs[pointer as usize];
                        pointer = pointer.wrapping_add(1);
                    }
                }
            }
        }

        state.pointers.insert(address, pointer);
        Ok(())
    }
}

/// 実際には待たず、要求された待ち時間を合計する遅延
#[derive(Debug, Default)]
pub struct RecordingDelay {
    pub total_ns: u64,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// 決められた値を順に返すアナログ入力（尽きたら最後の値を繰り返す）
#[derive(Debug, Default)]
pub struct ScriptedAnalog {
    values: VecDeque<u16>,
    last: u16,
    pub reads: usize,
    pub fail: bool,
}

impl ScriptedAnalog {
    pub fn constant(value: u16) -> Self {
        Self {
            last: value,
            ..Self::default()
        }
    }

    pub fn with_values(values: &[u16]) -> Self {
        Self {
            values: values.iter().copied().collect(),
            last: values.last().copied().unwrap_or(0),
            ..Self::default()
        }
    }

    pub fn push_values(&mut self, values: &[u16]) {
        self.values.extend(values.iter().copied());
        if let Some(&v) = values.last() {
            self.last = v;
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct AdcFault;

impl AnalogInput for ScriptedAnalog {
    type Error = AdcFault;

    fn read_raw(&mut self) -> Result<u16, AdcFault> {
        if self.fail {
            return Err(AdcFault);
        }
        self.reads += 1;
        Ok(self.values.pop_front().unwrap_or(self.last))
    }
}

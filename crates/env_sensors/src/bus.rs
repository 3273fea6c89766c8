use embedded_hal::i2c::I2c;

/// レジスタ単位のI2Cアクセサ
///
/// 同期・ブロッキングで動作し、リトライは行いません（リトライ方針は呼び出し側の責務）。
/// 各ドライバーは `&mut RegisterBus` を借用して使用するため、
/// バスの排他はコンパイル時に保証されます。
pub struct RegisterBus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> RegisterBus<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// 内部のI2Cドライバーを取り出す
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// 単一レジスタへ1バイト書き込み
    pub fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(address, &[register, value])
    }

    /// 単一レジスタから1バイト読み取り（リピーテッドスタート）
    pub fn read_register(&mut self, address: u8, register: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    /// `register` から連続読み取り（デバイス側のアドレス自動インクリメントが前提）
    pub fn read_registers(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), I2C::Error> {
        self.i2c.write_read(address, &[register], buf)
    }

    /// 下位・上位レジスタを個別に読み、リトルエンディアンの符号付き16bitに合成
    pub fn read_i16(&mut self, address: u8, low: u8, high: u8) -> Result<i16, I2C::Error> {
        let lo = self.read_register(address, low)?;
        let hi = self.read_register(address, high)?;
        Ok(i16::from_le_bytes([lo, hi]))
    }
}

/// 固定長の移動平均フィルター
///
/// 循環バッファで最古のサンプルを上書きし、全要素の算術平均を返します。
#[derive(Debug, Clone)]
pub struct MovingAverage<const N: usize> {
    buffer: [f32; N],
    index: usize,
}

impl<const N: usize> MovingAverage<N> {
    /// 全要素を `value` で埋めた状態で作成
    pub fn seeded(value: f32) -> Self {
        Self {
            buffer: [value; N],
            index: 0,
        }
    }

    /// 全要素を `value` で埋め直す
    pub fn reseed(&mut self, value: f32) {
        self.buffer = [value; N];
        self.index = 0;
    }

    /// サンプルを追加して現在の平均を返す
    pub fn push(&mut self, value: f32) -> f32 {
        self.buffer[self.index] = value;
        self.index = (self.index + 1) % N;
        self.mean()
    }

    pub fn mean(&self) -> f32 {
        self.buffer.iter().sum::<f32>() / N as f32
    }
}

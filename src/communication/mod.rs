pub mod payload;
pub mod uploader;

// Mock実装（ホストでのテスト用）
#[cfg(not(any(target_arch = "riscv32", target_arch = "xtensa")))]
pub mod mock;

pub use payload::ReadingPayload;
pub use uploader::{ReadingTransport, TransportError, UploadOutcome, Uploader};

//! センサー値の判定・集計・コンソールコマンド解析
//!
//! ハードウェアに依存しない純粋なロジックのみを含みます。

pub mod classifier;
pub mod command;
pub mod display;
pub mod monitor;

pub use classifier::{ComfortStatus, MotionStatus, OverallStatus, SoundStatus};
pub use command::{parse_command, CommandParseError, ConsoleCommand, LineAssembler};
pub use display::{DisplayAggregator, DisplayFrame};
pub use monitor::{AnalysisResult, SensorMonitor, SensorSnapshot, Trends};

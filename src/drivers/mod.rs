// src/drivers/mod.rs
// 设备侧核心：解码、滚动缓存、命令表、传输与会话
pub mod command;
pub mod decoder;
pub mod error;
pub mod series;
pub mod session;
pub mod simulator;
pub mod transport;
// 公开导出这些模块里的结构体，方便外部调用
pub use command::{CommandGroup, DeviceCommand};
pub use decoder::LineDecoder;
pub use error::{ConfigError, SessionError, TransportError};
pub use series::{ChartFrame, DisplayBounds, Sample, SeriesStore};
pub use session::{dispatch, PollOutcome, Session};
pub use simulator::SimulatedDevice;
pub use transport::{ReadOutcome, SerialTransport, Transport};

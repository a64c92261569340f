// src/types.rs
use crate::drivers::{ChartFrame, DeviceCommand};

// 连接模式
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ConnectionMode {
    Simulation,
    Hardware,
}

// 会话状态：只有 Connected 时按钮可用
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
}

impl SessionState {
    pub fn controls_enabled(self) -> bool {
        self == SessionState::Connected
    }
}

// GUI 发给后台的命令
#[derive(Clone, Debug)]
pub enum GuiCommand {
    Connect(ConnectionMode),
    Disconnect,
    Send(DeviceCommand),
}

// 后台发给 GUI 的消息
#[derive(Clone, Debug)]
pub enum PanelMessage {
    Log(String),
    Status(SessionState),
    Frame(ChartFrame), // 绘图数据
}

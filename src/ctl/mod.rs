//! 控制器模块
//!
//! 此模块包含控制器的决策核心：事件处理、统计轮询、选路后的流表下发和 ARP 代答。
//! 所有下行命令都经由注入的 [`CommandSink`] 发出。

// 子模块声明
mod arp;
mod command;
mod config;
mod controller;
mod decision;
mod error;
mod event;
mod flow;
mod stats;

// 重新导出公共接口
pub use arp::AddressResolver;
pub use command::{
    CommandSink, FlowMatch, FlowRule, PacketData, PacketOut, RecordingSink, SwitchCommand,
};
pub use config::{AddressEntry, ConfigError, ControllerConfig, StaticLink};
pub use controller::{Controller, PacketInOutcome};
pub use decision::{DecisionLog, DecisionRecord};
pub use error::{ControlError, SendError};
pub use event::{LinkDiscovered, PacketIn, PortStat};
pub use flow::{FlowTimeouts, InstallReport, TriggerPacket, install_path};
pub use stats::ControllerStats;

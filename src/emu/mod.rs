//! 仿真数据面
//!
//! 用仿真交换机代替真实的传输层与交换机，驱动控制器端到端运行：
//! 连接建立/断开、链路发现、周期性统计轮询与异步应答、主机流量触发 packet-in。

mod bootstrap;
mod events;
mod fabric;
mod world;

pub use bootstrap::bootstrap;
pub use events::{
    ConnectionDown, ConnectionUp, HostLearned, HostSend, HostTraffic, LinkUp, StatsReply,
    StatsTick,
};
pub use fabric::{Fabric, FabricStats};
pub use world::{ControllerWorld, HostAttachment};

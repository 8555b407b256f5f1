//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件：仿真时间、事件、世界、仿真器，
//! 以及描述一次仿真运行的 scenario 配置。

// 子模块声明
mod event;
mod scenario;
mod simulator;
mod time;
mod world;

// 重新导出公共接口
pub use event::Event;
pub use scenario::{FlowSpec, HostSpec, LinkSpec, PortLoadSpec, ScenarioSpec, SwitchSpec};
pub use simulator::Simulator;
pub use time::SimTime;
pub use world::World;

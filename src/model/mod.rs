///! # model
/// model 模块定义会话中的消息轮次以及与后端通信的报文格式

pub mod param;
pub mod turn;

pub use turn::{Role, Turn};

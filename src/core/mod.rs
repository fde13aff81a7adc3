//! 核心层：错误处理、响应封装、请求上下文与中间件

pub mod context;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod response;

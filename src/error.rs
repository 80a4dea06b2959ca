//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError`，覆盖旋转流水线之外的失败来源（配置、文件写入、
//! 状态锁、原生对话框）。
//!
//! 所有 `#[tauri::command]` 函数统一返回 `Result<T, AppError>`，
//! 前端通过 `Serialize` 获得可读的错误信息。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `RotatorError` / `std::io::Error` 提供 `From` 转换，无需手动 map。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 Tauri IPC 要求。

use serde::Serialize;

use crate::rotator::RotatorError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片旋转流水线错误（加载 / 解码 / 处理）
    #[error("{0}")]
    Rotator(#[from] RotatorError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件缺陷
    #[error("配置错误: {0}")]
    Config(String),

    /// 托管状态不可用（锁中毒、后台任务失败）
    #[error("状态错误: {0}")]
    State(String),

    /// 原生对话框失败
    #[error("对话框错误: {0}")]
    Dialog(String),
}

/// Tauri IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

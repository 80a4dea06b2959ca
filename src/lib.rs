//! # 图片 180° 旋转工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  前端 (ui/ 静态页面)                      │
//! │                                                          │
//! │  上传控件 ── 进度条/状态 ── 原图 | 旋转结果 ── 另存为     │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Tauri IPC (Result<Presentation, AppError>) + rotate-progress 事件
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  └─ rotator ──── 加载 · 解码缩放旋转 · LRU 缓存 · 展示    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有 Tauri command 的返回类型 |
//! | [`rotator`] | 上传/默认图片加载、缩放 + 180° 旋转、缓存、进度与下载产物 |
//!
//! 桌面外壳（命令、托管状态、`main.rs`）位于 `desktop` 特性之后；
//! 不启用该特性时本库不依赖任何 GUI 组件。

pub mod error;
pub mod rotator;

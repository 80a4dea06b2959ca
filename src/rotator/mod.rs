//! # 图片旋转模块（rotator）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 解码缩放旋转 → 展示与下载 → Tauri 命令暴露”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：仅做 IPC 入参/出参适配（薄封装，`desktop` 特性）
//! - `service`：承载可注入状态（`RotateServiceState`，`desktop` 特性）
//! - `handler`：编排一次交互的完整流水线，吞掉错误并转为展示结果
//! - `loader`：负责上传 / 文件加载与体积、签名校验
//! - `pipeline`：负责解码、像素格式归一化、降采样与 180° 旋转
//! - `cache`：以输入字节为键的定长 LRU 缓存
//! - `presenter`：进度里程碑、PNG 预览与下载产物
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 前端 invoke
//!    ↓
//! commands.rs（参数适配）
//!    ↓
//! service.rs（State 注入、进度事件、spawn_blocking）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（上传/文件加载 + 体积/签名校验）
//!    ├─ cache.rs → pipeline.rs（解码 + 降采样 + 旋转）
//!    └─ presenter.rs（预览 + rotated_180.png）
//!    ↓
//! 返回 Presentation 给前端
//! ```

mod cache;
mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod presenter;
mod source;

#[cfg(feature = "desktop")]
pub mod commands;
#[cfg(feature = "desktop")]
mod service;

pub use cache::{CacheStats, TransformCache};
pub use config::{
    DOWNLOAD_FILE_NAME, DOWNLOAD_MIME_TYPE, ResizeFilter, RotatorConfig, SUPPORTED_EXTENSIONS,
};
pub use error::RotatorError;
pub use handler::RotateHandler;
pub use loader::Loader;
pub use pipeline::{Transformer, fit_within};
pub use presenter::{
    DownloadArtifact, Presentation, ProgressSink, ProgressStage, ProgressUpdate,
    RecordingProgressSink, RenderedView, encode_png, render,
};
pub use source::{
    ImageBytes, PixelFormat, Raster, RotateRequest, TransformResult, UploadContent, UploadedFile,
};

#[cfg(feature = "desktop")]
pub use service::{ROTATE_PROGRESS_EVENT, RotateServiceState};

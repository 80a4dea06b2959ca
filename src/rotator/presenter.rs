//! # 展示层适配
//!
//! ## 设计思路
//!
//! 展示层不含算法，只做三件事：
//! 1. 按固定里程碑（加载 → 处理 → 展示 → 完成）上报进度与总耗时
//! 2. 将原图与旋转结果编码为 PNG 预览，供前端并排展示
//! 3. 生成下载产物（`rotated_180.png` / `image/png`）
//!
//! 进度上报通过 `ProgressSink` 抽象，桌面端转发为 IPC 事件，测试中直接记录。

use base64::{Engine as _, engine::general_purpose};
use image::ImageFormat;
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;

use super::source::{Raster, TransformResult};
use super::{DOWNLOAD_FILE_NAME, DOWNLOAD_MIME_TYPE, RotatorError};

/// 进度阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Loading,
    Processing,
    Displaying,
    Completed,
    Failed,
}

/// 单条进度更新。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub stage: ProgressStage,
    pub percent: u8,
    pub message: String,
}

impl ProgressUpdate {
    pub fn loading() -> Self {
        Self::new(ProgressStage::Loading, 10, "Loading image...")
    }

    pub fn processing() -> Self {
        Self::new(ProgressStage::Processing, 30, "Processing image (rotate 180°)...")
    }

    pub fn displaying() -> Self {
        Self::new(ProgressStage::Displaying, 80, "Displaying results...")
    }

    pub fn completed(elapsed: Duration) -> Self {
        Self::new(
            ProgressStage::Completed,
            100,
            format!("Completed in {:.2} seconds", elapsed.as_secs_f64()),
        )
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(ProgressStage::Failed, 0, message)
    }

    fn new(stage: ProgressStage, percent: u8, message: impl Into<String>) -> Self {
        Self {
            stage,
            percent,
            message: message.into(),
        }
    }
}

/// 进度接收方。
pub trait ProgressSink {
    fn report(&mut self, update: &ProgressUpdate);
}

/// 按顺序收集进度，便于断言与回放。
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    pub updates: Vec<ProgressUpdate>,
}

impl ProgressSink for RecordingProgressSink {
    fn report(&mut self, update: &ProgressUpdate) {
        self.updates.push(update.clone());
    }
}

/// 下载产物。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// 并排展示所需的数据。
#[derive(Debug, Clone, Serialize)]
pub struct RenderedView {
    /// 原图（缩放后）预览，PNG Data URL。
    pub original_preview: String,
    /// 旋转结果预览，PNG Data URL。
    pub rotated_preview: String,
    pub original_size: (u32, u32),
    pub rotated_size: (u32, u32),
    pub elapsed_seconds: f64,
    pub download_name: &'static str,
    pub download_mime: &'static str,
    /// 下载内容不经 IPC 传输，由服务层暂存。
    #[serde(skip)]
    pub download: DownloadArtifact,
}

/// 一次交互的最终呈现。
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Presentation {
    Rendered(RenderedView),
    Prompt {
        message: String,
    },
    Failed {
        code: &'static str,
        stage: &'static str,
        message: String,
    },
}

impl Presentation {
    pub fn upload_prompt() -> Self {
        Self::Prompt {
            message: "Please upload an image to get started!".to_string(),
        }
    }

    pub fn failed(error: &RotatorError) -> Self {
        Self::Failed {
            code: error.code(),
            stage: error.stage(),
            message: error.to_string(),
        }
    }

    pub fn rendered(&self) -> Option<&RenderedView> {
        match self {
            Self::Rendered(view) => Some(view),
            _ => None,
        }
    }
}

/// 将栅格编码为 PNG 字节。失败归入展示阶段。
pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, RotatorError> {
    let image = raster.to_image().map_err(|err| match err {
        RotatorError::Processing(detail) => RotatorError::Present(detail),
        other => other,
    })?;

    let mut buf = Cursor::new(Vec::new());
    image
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| RotatorError::Present(format!("PNG encode failed: {}", e)))?;
    Ok(buf.into_inner())
}

fn png_data_url(png: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        DOWNLOAD_MIME_TYPE,
        general_purpose::STANDARD.encode(png)
    )
}

/// 构建并排展示与下载产物。
pub fn render(result: &TransformResult, elapsed: Duration) -> Result<RenderedView, RotatorError> {
    let original_png = encode_png(&result.original)?;
    let rotated_png = encode_png(&result.transformed)?;

    Ok(RenderedView {
        original_preview: png_data_url(&original_png),
        rotated_preview: png_data_url(&rotated_png),
        original_size: result.original.dimensions(),
        rotated_size: result.transformed.dimensions(),
        elapsed_seconds: elapsed.as_secs_f64(),
        download_name: DOWNLOAD_FILE_NAME,
        download_mime: DOWNLOAD_MIME_TYPE,
        download: DownloadArtifact {
            file_name: DOWNLOAD_FILE_NAME,
            mime_type: DOWNLOAD_MIME_TYPE,
            bytes: rotated_png,
        },
    })
}

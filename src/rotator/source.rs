//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `RotateRequest` / `UploadedFile` 表示一次交互的输入语义
//! - `ImageBytes` 表示已加载但未解码的字节，同时充当缓存键
//! - `Raster` 表示解码后的像素网格，创建后不可变
//! - `TransformResult` 表示缩放后原图与旋转结果的成对输出

use std::path::PathBuf;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Rgb, Rgba};

use super::RotatorError;

/// 一次交互的输入来源。
#[derive(Debug, Clone)]
pub enum RotateRequest {
    /// 用户上传的文件。
    Upload(UploadedFile),
    /// 未上传时按配置顺序查找默认图片。
    DefaultImage,
    /// 指定的本地路径。
    FilePath(PathBuf),
}

/// 上传文件：声明体积 + 延迟读取的内容。
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// 原始文件名（仅用于日志）。
    pub name: String,
    /// 前端声明的字节数，读取内容前先据此做体积校验。
    pub size: u64,
    /// 文件内容。
    pub content: UploadContent,
}

/// 上传内容的承载形式。
#[derive(Debug, Clone)]
pub enum UploadContent {
    /// 原始字节。
    Raw(Vec<u8>),
    /// Base64（支持 Data URL 与纯 Base64 字符串），webview 经 IPC 传来的形式。
    Base64(String),
}

impl UploadedFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content: UploadContent::Raw(bytes),
        }
    }

    pub fn from_base64(name: impl Into<String>, size: u64, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            content: UploadContent::Base64(data.into()),
        }
    }
}

/// 编码后的图片字节（PNG/JPEG）。
///
/// 内部为共享缓冲，克隆开销为常数；相等与哈希均按完整内容比较，
/// 因此可直接作为变换缓存的键。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageBytes(Arc<[u8]>);

impl ImageBytes {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ImageBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(Arc::from(bytes))
    }
}

impl AsRef<[u8]> for ImageBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 像素格式，解码后统一收敛到这两种。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Rgb,
    Rgba,
}

impl PixelFormat {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// 解码后的像素网格。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Raster {
    /// 从 `DynamicImage` 构建，要求已完成像素格式归一化。
    pub(crate) fn from_image(image: DynamicImage) -> Result<Self, RotatorError> {
        let (format, width, height, pixels) = match image {
            DynamicImage::ImageRgb8(buf) => {
                let (w, h) = buf.dimensions();
                (PixelFormat::Rgb, w, h, buf.into_raw())
            }
            DynamicImage::ImageRgba8(buf) => {
                let (w, h) = buf.dimensions();
                (PixelFormat::Rgba, w, h, buf.into_raw())
            }
            other => {
                return Err(RotatorError::Processing(format!(
                    "unexpected pixel layout after normalization: {:?}",
                    other.color()
                )));
            }
        };

        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// 直接拼装栅格，不校验缓冲区长度。
    #[cfg(test)]
    pub(crate) fn from_raw_parts(
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    /// 转回 `DynamicImage`，用于编码与再次变换。
    pub fn to_image(&self) -> Result<DynamicImage, RotatorError> {
        let invalid = || RotatorError::Processing("raster buffer length mismatch".to_string());
        match self.format {
            PixelFormat::Rgb => {
                ImageBuffer::<Rgb<u8>, _>::from_raw(self.width, self.height, self.pixels.clone())
                    .map(DynamicImage::ImageRgb8)
                    .ok_or_else(invalid)
            }
            PixelFormat::Rgba => {
                ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, self.pixels.clone())
                    .map(DynamicImage::ImageRgba8)
                    .ok_or_else(invalid)
            }
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// 读取单个像素的通道值；越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.format.channels();
        let offset = (y as usize * self.width as usize + x as usize) * channels;
        self.pixels.get(offset..offset + channels)
    }
}

/// 变换输出：缩放后的原图与旋转 180° 的结果。
///
/// 两张图以 `Arc` 共享，缓存命中时直接复用同一份数据。
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub original: Arc<Raster>,
    pub transformed: Arc<Raster>,
}

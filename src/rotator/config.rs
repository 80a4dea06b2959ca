//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `RotatorConfig`：上传体积上限、最长边上限、
//! 缩放滤镜、缓存容量与默认图片候选列表。
//!
//! ## 实现思路
//!
//! - `Default` 提供与产品一致的配置（10MB / 2000px / Lanczos3）。
//! - 所有字段都带 `#[serde(default)]`，配置文件只需写出要覆盖的项。
//! - `load` 在文件缺失时回退默认值，解析或取值异常时返回 `AppError::Config`。
//! - `guidelines` 输出侧栏“图片说明”面板的文案。

use std::fs;
use std::path::{Path, PathBuf};

use fast_image_resize as fr;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::error::megabytes;
use crate::error::AppError;

/// 下载文件名。
pub const DOWNLOAD_FILE_NAME: &str = "rotated_180.png";
/// 下载 MIME 类型。
pub const DOWNLOAD_MIME_TYPE: &str = "image/png";
/// 上传允许的扩展名（仅用于提示与前端过滤，真实类型以文件签名为准）。
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 缩放滤镜策略。
///
/// 独立于 `image::imageops::FilterType`，以便序列化并同时映射到
/// `fast_image_resize` 与 `image` 两套实现。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl ResizeFilter {
    /// `Nearest` 直接取最近像素，其余滤镜走卷积。
    pub(crate) fn to_fast_alg(self) -> fr::ResizeAlg {
        match self {
            Self::Nearest => fr::ResizeAlg::Nearest,
            Self::Bilinear => fr::ResizeAlg::Convolution(fr::FilterType::Bilinear),
            Self::CatmullRom => fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom),
            Self::Lanczos3 => fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3),
        }
    }

    pub(crate) fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// 图片旋转配置。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotatorConfig {
    /// 上传或读取原始字节时允许的最大文件体积（字节），即 `MAX_FILE_SIZE`。
    pub max_file_size: u64,
    /// 旋转前最长边上限（像素），即 `MAX_IMAGE_SIZE`。只缩小不放大。
    pub max_image_size: u32,
    /// 解码前按图片头校验的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 降采样滤镜。
    pub resize_filter: ResizeFilter,
    /// 变换结果缓存的最大条目数。
    pub cache_capacity: usize,
    /// 未上传时按顺序尝试的默认图片。
    pub default_images: Vec<PathBuf>,
}

impl Default for RotatorConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024,
            max_image_size: 2000,
            max_decoded_pixels: 100_000_000,
            resize_filter: ResizeFilter::Lanczos3,
            cache_capacity: 8,
            default_images: vec![PathBuf::from("./zebra.jpg"), PathBuf::from("./wallaby.png")],
        }
    }
}

impl RotatorConfig {
    /// 从 JSON 文件加载配置。
    ///
    /// 文件不存在时返回默认配置；存在但无法解析或取值非法时报错。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_rotator::rotator::RotatorConfig;
    ///
    /// let config = RotatorConfig::load("rotator.json")?;
    /// assert!(config.max_image_size > 0);
    /// # Ok::<(), image_rotator::error::AppError>(())
    /// ```
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("⚙️ 未找到配置文件，使用默认配置 - 路径: {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str::<Self>(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败（{}）：{}", path.display(), e)))?;
        config.validate()?;

        log::info!(
            "⚙️ 已加载配置 - max_file_size={} max_image_size={} filter={:?} cache_capacity={}",
            config.max_file_size,
            config.max_image_size,
            config.resize_filter,
            config.cache_capacity
        );

        Ok(config)
    }

    /// 校验取值范围。
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_file_size == 0 {
            return Err(AppError::Config("max_file_size 必须大于 0".to_string()));
        }
        if self.max_image_size == 0 {
            return Err(AppError::Config("max_image_size 必须大于 0".to_string()));
        }
        if self.max_decoded_pixels == 0 {
            return Err(AppError::Config("max_decoded_pixels 必须大于 0".to_string()));
        }
        if self.cache_capacity == 0 {
            return Err(AppError::Config("cache_capacity 必须大于 0".to_string()));
        }
        Ok(())
    }

    /// 侧栏“图片说明”文案。
    pub fn guidelines(&self) -> Vec<String> {
        vec![
            format!("Maximum file size: {}MB", megabytes(&self.max_file_size)),
            format!(
                "Large images will be automatically resized (max dimension: {}px)",
                self.max_image_size
            ),
            format!(
                "Supported formats: {}",
                SUPPORTED_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_uppercase())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            "Processing time depends on image size".to_string(),
        ]
    }
}

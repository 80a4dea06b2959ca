//! # 解码与变换流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → 缩放 → 旋转”的过程集中管理，并在解码前增加像素上限控制。
//! 优先读取图片头尺寸，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并读取 header 尺寸，按像素上限快速拒绝
//! 2. 完整解码
//! 3. 像素格式归一化：RGB / RGBA 保留，其余统一转 RGBA
//! 4. 最长边超过上限时按比例缩小（fast_image_resize，失败回退 image）
//! 5. 旋转 180°，画布尺寸不变

use fast_image_resize as fr;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageReader, Rgb, Rgba};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use super::source::{ImageBytes, Raster, TransformResult};
use super::{ResizeFilter, RotatorConfig, RotatorError};

/// 计算等比缩小后的目标尺寸。
///
/// 两边都不超过 `max_size` 时原样返回；否则最长边等于 `max_size`，
/// 短边为 `round(shorter * max_size / longer)`，且至少为 1。
pub fn fit_within(width: u32, height: u32, max_size: u32) -> (u32, u32) {
    if width <= max_size && height <= max_size {
        return (width, height);
    }

    let scale_short = |shorter: u32, longer: u32| -> u32 {
        let scaled = (shorter as u64 * max_size as u64 + longer as u64 / 2) / longer as u64;
        (scaled as u32).max(1)
    };

    if width >= height {
        (max_size, scale_short(height, width))
    } else {
        (scale_short(width, height), max_size)
    }
}

/// 解码、缩放与旋转的执行者。
pub struct Transformer {
    config: RotatorConfig,
}

impl Transformer {
    pub fn new(config: RotatorConfig) -> Self {
        Self { config }
    }

    /// 执行完整变换，返回（缩放后原图，旋转结果）。
    pub fn transform(&self, bytes: &ImageBytes) -> Result<TransformResult, RotatorError> {
        let start = Instant::now();

        let decoded = self.decode(bytes)?;
        let (raw_width, raw_height) = decoded.dimensions();

        let normalized = normalize_pixel_format(decoded);
        let resized = self.downscale_to_fit(normalized)?;
        let rotated = rotate_half_turn(&resized)?;

        let original = Raster::from_image(resized)?;
        let transformed = Raster::from_image(rotated)?;

        log::info!(
            "✅ 图片变换完成 - 原始尺寸: {}x{} 输出尺寸: {}x{} 格式: {:?} 耗时: {}ms",
            raw_width,
            raw_height,
            transformed.width(),
            transformed.height(),
            transformed.format(),
            start.elapsed().as_millis()
        );

        Ok(TransformResult {
            original: Arc::new(original),
            transformed: Arc::new(transformed),
        })
    }

    fn decode(&self, bytes: &ImageBytes) -> Result<DynamicImage, RotatorError> {
        let (header_width, header_height) = inspect_dimensions_from_memory(bytes.as_slice())?;
        self.validate_pixel_limits(header_width, header_height)?;

        image::load_from_memory(bytes.as_slice())
            .map_err(|e| RotatorError::Decode(format!("failed to decode image: {}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(&self, width: u32, height: u32) -> Result<(), RotatorError> {
        let pixels = width as u64 * height as u64;
        if pixels > self.config.max_decoded_pixels {
            return Err(RotatorError::Processing(format!(
                "image has too many pixels: {}x{} (limit: {} pixels)",
                width, height, self.config.max_decoded_pixels
            )));
        }
        Ok(())
    }

    /// 最长边超过上限时按比例缩小，只缩小不放大。
    fn downscale_to_fit(&self, image: DynamicImage) -> Result<DynamicImage, RotatorError> {
        let (width, height) = image.dimensions();
        let (target_width, target_height) = fit_within(width, height, self.config.max_image_size);

        if (target_width, target_height) == (width, height) {
            return Ok(image);
        }

        log::info!(
            "🧩 降采样：{}x{} -> {}x{}（filter={:?}）",
            width,
            height,
            target_width,
            target_height,
            self.config.resize_filter
        );

        match resize_with_fast_image_resize(
            &image,
            target_width,
            target_height,
            self.config.resize_filter,
        ) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                Ok(image.resize_exact(
                    target_width,
                    target_height,
                    self.config.resize_filter.to_image_filter(),
                ))
            }
        }
    }
}

/// 仅通过内存中的图片头信息读取宽高。
fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), RotatorError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| RotatorError::Decode(format!("cannot detect image format: {}", e)))?
        .into_dimensions()
        .map_err(|e| RotatorError::Decode(format!("cannot read image dimensions: {}", e)))
}

/// RGB8 / RGBA8 原样保留，其余布局（灰度、16 位、浮点等）统一转为 RGBA8。
pub(crate) fn normalize_pixel_format(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => image,
        other => {
            log::debug!("🎨 像素格式 {:?} 归一化为 RGBA8", other.color());
            DynamicImage::ImageRgba8(other.to_rgba8())
        }
    }
}

/// 旋转 180°：(x, y) → (W−1−x, H−1−y)。
///
/// 半圈旋转不改变宽高，画布无需扩展；其它角度不在此处理。
pub(crate) fn rotate_half_turn(image: &DynamicImage) -> Result<DynamicImage, RotatorError> {
    let rotated = image.rotate180();
    if rotated.dimensions() != image.dimensions() {
        return Err(RotatorError::Processing(
            "180° rotation changed canvas dimensions".to_string(),
        ));
    }
    Ok(rotated)
}

fn resize_with_fast_image_resize(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
    filter: ResizeFilter,
) -> Result<DynamicImage, RotatorError> {
    let (src_width, src_height) = image.dimensions();
    let (pixel_type, buffer) = match image {
        DynamicImage::ImageRgb8(buf) => (fr::PixelType::U8x3, buf.as_raw().clone()),
        _ => (fr::PixelType::U8x4, image.to_rgba8().into_raw()),
    };

    let src_image = fr::images::Image::from_vec_u8(src_width, src_height, buffer, pixel_type)
        .map_err(|e| RotatorError::Processing(format!("failed to build source buffer: {}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, pixel_type);

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new().resize_alg(filter.to_fast_alg());

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| RotatorError::Processing(format!("fast_image_resize failed: {}", e)))?;

    let invalid = || RotatorError::Processing("resized buffer length mismatch".to_string());
    let resized = match pixel_type {
        fr::PixelType::U8x3 => DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, _>::from_raw(target_width, target_height, dst_image.into_vec())
                .ok_or_else(invalid)?,
        ),
        _ => DynamicImage::ImageRgba8(
            ImageBuffer::<Rgba<u8>, _>::from_raw(target_width, target_height, dst_image.into_vec())
                .ok_or_else(invalid)?,
        ),
    };

    Ok(resized)
}

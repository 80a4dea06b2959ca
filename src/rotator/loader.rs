//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理两种来源（上传 / 本地文件）的原始字节加载，并在“尽可能早”的阶段执行输入校验。
//! 目标是尽快失败：超限的上传在读取内容之前就被拒绝，不会进入解码流程。
//!
//! ## 实现思路
//!
//! - 上传：声明体积校验 → Base64 解码前估算上限 → 实际体积复核 → 文件签名（PNG/JPEG）。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 默认图片：按配置顺序返回第一个存在的路径。

use base64::{Engine as _, engine::general_purpose};
use std::fs;
use std::path::{Path, PathBuf};

use super::source::{ImageBytes, UploadContent, UploadedFile};
use super::{RotatorConfig, RotatorError};

/// 上传允许的 MIME 类型（按文件签名判断）。
const ACCEPTED_UPLOAD_MIME_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// 原始字节加载器。
pub struct Loader<'a> {
    config: &'a RotatorConfig,
}

impl<'a> Loader<'a> {
    pub fn new(config: &'a RotatorConfig) -> Self {
        Self { config }
    }

    /// 校验上传的声明体积，不读取内容。
    pub fn check_upload_size(&self, upload: &UploadedFile) -> Result<(), RotatorError> {
        self.check_size(upload.size)
    }

    /// 读取上传内容。
    pub fn load_upload(&self, upload: UploadedFile) -> Result<ImageBytes, RotatorError> {
        log::info!("📤 开始读取上传图片 - 文件名: {} 声明体积: {}B", upload.name, upload.size);

        self.check_upload_size(&upload)?;

        let bytes = match upload.content {
            UploadContent::Raw(bytes) => bytes,
            UploadContent::Base64(data) => parse_base64_with_limit(&data, self.config.max_file_size)?,
        };

        // 声明体积可能与实际内容不符，读取后再复核一次。
        self.check_size(bytes.len() as u64)?;
        validate_upload_signature(&bytes)?;

        Ok(ImageBytes::from(bytes))
    }

    /// 从本地路径读取图片字节。
    pub fn load_file(&self, path: &Path) -> Result<ImageBytes, RotatorError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(RotatorError::MissingFile(format!(
                "Default image not found at path: {}",
                path.display()
            )));
        }

        let metadata = fs::metadata(path)
            .map_err(|e| RotatorError::MissingFile(format!("Cannot read file metadata: {}", e)))?;
        if metadata.len() > self.config.max_file_size {
            return Err(RotatorError::OversizedFile {
                size: metadata.len(),
                limit: self.config.max_file_size,
            });
        }

        let bytes = fs::read(path)
            .map_err(|e| RotatorError::MissingFile(format!("Cannot read image file: {}", e)))?;

        Ok(ImageBytes::from(bytes))
    }

    /// 按优先顺序查找第一个存在的默认图片。
    pub fn locate_default(&self) -> Result<PathBuf, RotatorError> {
        self.config
            .default_images
            .iter()
            .find(|candidate| candidate.is_file())
            .cloned()
            .ok_or_else(|| {
                RotatorError::MissingFile("No upload supplied and no default image found".to_string())
            })
    }

    fn check_size(&self, size: u64) -> Result<(), RotatorError> {
        if size > self.config.max_file_size {
            return Err(RotatorError::OversizedInput {
                size,
                limit: self.config.max_file_size,
            });
        }
        Ok(())
    }
}

/// 去掉 Data URL 前缀，返回纯 Base64 部分。
fn strip_data_url_prefix(data: &str) -> &str {
    let trimmed = data.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(',') {
            return payload.trim();
        }
    }
    trimmed
}

/// 估算 Base64 解码后的字节数上界。
fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> u64 {
    (base64_data.len() as u64).div_ceil(4) * 3
}

/// 在解码前按估算长度拒绝超限数据，避免为超大载荷分配内存。
fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, RotatorError> {
    let payload = strip_data_url_prefix(data);
    let padding = payload.bytes().rev().take_while(|b| *b == b'=').count() as u64;
    let estimated = estimate_base64_decoded_upper_bound_len(payload).saturating_sub(padding);

    if estimated > max_file_size {
        return Err(RotatorError::OversizedInput {
            size: estimated,
            limit: max_file_size,
        });
    }

    general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| RotatorError::Decode(format!("invalid base64 payload: {}", e)))
}

/// 通过文件签名（magic bytes）校验上传内容为 PNG 或 JPEG。
fn validate_upload_signature(bytes: &[u8]) -> Result<(), RotatorError> {
    if bytes.is_empty() {
        return Err(RotatorError::Decode("image content is empty".to_string()));
    }

    let kind = infer::get(bytes)
        .ok_or_else(|| RotatorError::Decode("unrecognized image type".to_string()))?;

    if !ACCEPTED_UPLOAD_MIME_TYPES.contains(&kind.mime_type()) {
        return Err(RotatorError::Decode(format!(
            "unsupported file type {} (supported: PNG, JPG, JPEG)",
            kind.mime_type()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
    use std::io::Cursor;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 255])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    #[test]
    fn oversized_declared_upload_is_rejected_before_reading() {
        let config = RotatorConfig::default();
        let loader = Loader::new(&config);
        // 内容不是合法 Base64，若被读取会得到 Decode 错误。
        let upload = UploadedFile::from_base64("big.png", 11 * 1024 * 1024, "!!not-base64!!");

        let result = loader.load_upload(upload);

        assert!(matches!(
            result,
            Err(RotatorError::OversizedInput { size, limit })
                if size == 11 * 1024 * 1024 && limit == 10 * 1024 * 1024
        ));
    }

    #[test]
    fn understated_upload_size_is_caught_after_reading() {
        let config = RotatorConfig {
            max_file_size: 64,
            ..RotatorConfig::default()
        };
        let loader = Loader::new(&config);
        let upload = UploadedFile {
            name: "liar.png".to_string(),
            size: 10,
            content: UploadContent::Raw(vec![0u8; 128]),
        };

        assert!(matches!(
            loader.load_upload(upload),
            Err(RotatorError::OversizedInput { size: 128, .. })
        ));
    }

    #[test]
    fn base64_payload_over_limit_is_rejected_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(RotatorError::OversizedInput { .. })));
    }

    #[test]
    fn data_url_upload_is_decoded() {
        let png = create_png_bytes(4, 4);
        let data_url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(&png)
        );
        let config = RotatorConfig::default();
        let loader = Loader::new(&config);

        let bytes = loader
            .load_upload(UploadedFile::from_base64("a.png", png.len() as u64, data_url))
            .expect("upload should load");

        assert_eq!(bytes.as_slice(), png.as_slice());
    }

    #[test]
    fn non_image_upload_is_rejected() {
        let config = RotatorConfig::default();
        let loader = Loader::new(&config);
        let upload = UploadedFile::from_bytes("note.txt", b"hello world".to_vec());

        assert!(matches!(loader.load_upload(upload), Err(RotatorError::Decode(_))));
    }

    #[test]
    fn gif_upload_is_rejected_even_though_it_is_an_image() {
        let config = RotatorConfig::default();
        let loader = Loader::new(&config);
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();

        assert!(matches!(
            loader.load_upload(UploadedFile::from_bytes("anim.gif", gif)),
            Err(RotatorError::Decode(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let config = RotatorConfig::default();
        let loader = Loader::new(&config);
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let path = dir.path().join("zebra.jpg");

        match loader.load_file(&path) {
            Err(RotatorError::MissingFile(message)) => {
                assert!(message.starts_with("Default image not found at path:"));
            }
            other => panic!("expected MissingFile, got {:?}", other),
        }
    }

    #[test]
    fn oversized_file_is_rejected_via_metadata() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let path = dir.path().join("big.png");
        fs::write(&path, vec![0u8; 256]).expect("write file failed");
        let config = RotatorConfig {
            max_file_size: 100,
            ..RotatorConfig::default()
        };

        assert!(matches!(
            Loader::new(&config).load_file(&path),
            Err(RotatorError::OversizedFile { size: 256, limit: 100 })
        ));
    }

    #[test]
    fn upload_exactly_at_limit_is_accepted() {
        let png = create_png_bytes(3, 3);
        let config = RotatorConfig {
            max_file_size: png.len() as u64,
            ..RotatorConfig::default()
        };
        let loader = Loader::new(&config);
        let upload = UploadedFile::from_bytes("edge.png", png.clone());

        assert!(loader.check_upload_size(&upload).is_ok());
        let bytes = loader.load_upload(upload).expect("upload at limit should load");
        assert_eq!(bytes.len(), png.len());
    }

    #[test]
    fn upload_one_byte_over_limit_is_rejected() {
        let png = create_png_bytes(3, 3);
        let config = RotatorConfig {
            max_file_size: png.len() as u64 - 1,
            ..RotatorConfig::default()
        };

        assert!(matches!(
            Loader::new(&config).load_upload(UploadedFile::from_bytes("edge.png", png)),
            Err(RotatorError::OversizedInput { .. })
        ));
    }

    #[test]
    fn file_exactly_at_limit_is_read() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let path = dir.path().join("edge.png");
        let png = create_png_bytes(3, 3);
        fs::write(&path, &png).expect("write file failed");
        let config = RotatorConfig {
            max_file_size: png.len() as u64,
            ..RotatorConfig::default()
        };

        let bytes = Loader::new(&config).load_file(&path).expect("file at limit should load");
        assert_eq!(bytes.as_slice(), png.as_slice());
    }

    #[test]
    fn locate_default_follows_preference_order() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let zebra = dir.path().join("zebra.jpg");
        let wallaby = dir.path().join("wallaby.png");
        fs::write(&wallaby, create_png_bytes(2, 2)).expect("write wallaby failed");

        let config = RotatorConfig {
            default_images: vec![zebra.clone(), wallaby.clone()],
            ..RotatorConfig::default()
        };
        let loader = Loader::new(&config);
        assert_eq!(loader.locate_default().expect("wallaby exists"), wallaby);

        fs::write(&zebra, create_png_bytes(2, 2)).expect("write zebra failed");
        assert_eq!(loader.locate_default().expect("zebra exists"), zebra);
    }

    #[test]
    fn locate_default_without_candidates_is_missing_file() {
        let dir = tempfile::tempdir().expect("create temp dir failed");
        let config = RotatorConfig {
            default_images: vec![dir.path().join("zebra.jpg")],
            ..RotatorConfig::default()
        };

        assert!(matches!(
            Loader::new(&config).locate_default(),
            Err(RotatorError::MissingFile(_))
        ));
    }
}

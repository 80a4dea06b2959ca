//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 旋转链路的所有失败都收敛到 `RotatorError`，调用侧按分支匹配，
//! 展示层只关心 `to_string()` 给出的用户可读文案。
//! `code()` / `stage()` 给前端提供稳定的机器可读标识。

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// 图片旋转统一错误类型。
///
/// 该类型在 `RotateHandler` 内被转换为 `Presentation::Failed`，不会向外抛出；
/// 命令层需要时再上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum RotatorError {
    #[error(
        "The uploaded file is too large. Please upload an image smaller than {}MB.",
        megabytes(.limit)
    )]
    OversizedInput { size: u64, limit: u64 },

    #[error(
        "The image file is too large ({}MB). Images must be smaller than {}MB.",
        megabytes(.size),
        megabytes(.limit)
    )]
    OversizedFile { size: u64, limit: u64 },

    #[error("{0}")]
    MissingFile(String),

    #[error("Error decoding image: {0}")]
    Decode(String),

    #[error("Error processing image: {0}")]
    Processing(String),

    #[error("Error displaying image: {0}")]
    Present(String),
}

/// 字节数格式化为一位小数的 MB。
pub(crate) fn megabytes(bytes: &u64) -> String {
    format!("{:.1}", *bytes as f64 / BYTES_PER_MB)
}

impl RotatorError {
    /// 稳定错误码，前端据此区分提示样式。
    pub fn code(&self) -> &'static str {
        match self {
            Self::OversizedInput { .. } | Self::OversizedFile { .. } => "oversized_input",
            Self::MissingFile(_) => "missing_file",
            Self::Decode(_) => "decode",
            Self::Processing(_) => "processing",
            Self::Present(_) => "display",
        }
    }

    /// 出错阶段（load / process / display）。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::OversizedInput { .. } | Self::OversizedFile { .. } | Self::MissingFile(_) => {
                "load"
            }
            Self::Decode(_) | Self::Processing(_) => "process",
            Self::Present(_) => "display",
        }
    }
}

impl From<RotatorError> for String {
    fn from(error: RotatorError) -> Self {
        error.to_string()
    }
}

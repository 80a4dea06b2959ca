//! # Tauri 命令层
//!
//! ## 设计思路
//!
//! 命令层仅做 IPC 参数接收与结果返回，不承载业务逻辑。
//! 所有实际处理交由 `RotateServiceState`，保持命令函数薄、稳定。

use std::path::PathBuf;

use tauri::{AppHandle, State, Wry};
use tauri_plugin_dialog::DialogExt;

use super::{Presentation, RotateRequest, RotateServiceState, UploadedFile};
use crate::error::AppError;

/// 旋转用户上传的图片。`data` 为 Base64 或 Data URL。
#[tauri::command]
pub async fn rotate_uploaded_image(
    state: State<'_, RotateServiceState>,
    app: AppHandle<Wry>,
    name: String,
    size: u64,
    data: String,
) -> Result<Presentation, AppError> {
    let upload = UploadedFile::from_base64(name, size, data);
    state
        .run_with_progress(&app, RotateRequest::Upload(upload))
        .await
}

/// 未上传时按优先顺序旋转默认图片；都不存在时返回上传提示。
#[tauri::command]
pub async fn rotate_default_image(
    state: State<'_, RotateServiceState>,
    app: AppHandle<Wry>,
) -> Result<Presentation, AppError> {
    state.run_with_progress(&app, RotateRequest::DefaultImage).await
}

/// 侧栏“图片说明”文案。
#[tauri::command]
pub fn get_image_guidelines(state: State<'_, RotateServiceState>) -> Vec<String> {
    state.guidelines()
}

/// 弹出另存为对话框并写入 `rotated_180.png`。
///
/// 用户取消时返回 `None`。
#[tauri::command]
pub async fn save_rotated_image(
    state: State<'_, RotateServiceState>,
    app: AppHandle<Wry>,
) -> Result<Option<String>, AppError> {
    let artifact = state
        .last_download()?
        .ok_or_else(|| AppError::State("没有可下载的旋转结果".to_string()))?;

    let file_name = artifact.file_name;
    let picked = tokio::task::spawn_blocking(move || {
        app.dialog()
            .file()
            .set_file_name(file_name)
            .add_filter("PNG", &["png"])
            .blocking_save_file()
    })
    .await
    .map_err(|e| AppError::Dialog(format!("对话框任务失败: {e}")))?;

    let Some(picked) = picked else {
        log::info!("💾 用户取消保存");
        return Ok(None);
    };

    let path: PathBuf = picked
        .into_path()
        .map_err(|e| AppError::Dialog(format!("无法解析保存路径: {e}")))?;
    std::fs::write(&path, &artifact.bytes)?;

    log::info!(
        "💾 已保存旋转结果 - 路径: {} 体积: {}B 类型: {}",
        path.display(),
        artifact.bytes.len(),
        artifact.mime_type
    );

    Ok(Some(path.display().to_string()))
}

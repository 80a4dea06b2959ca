//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `RotateServiceState` 作为 Tauri 注入状态，替代全局单例。
//! 好处：
//! 1. 生命周期清晰（由 `main.rs` 统一管理）
//! 2. 缓存随会话实例创建，不存在跨会话共享
//! 3. 测试可直接使用 `RotateHandler`，与 Tauri 解耦
//!
//! ## 实现思路
//!
//! - 处理器放在 `Mutex` 内，同一会话的交互严格串行。
//! - 流水线在 `spawn_blocking` 中运行，进度通过 `rotate-progress` 事件推送给前端。
//! - 最近一次结果的下载产物由 `RotateHandler` 在持锁期间更新，
//!   “另存为”读取时同样经过处理器锁，与交互顺序一致。

use std::sync::{Arc, Mutex};

use tauri::{AppHandle, Emitter, Wry};

use super::{
    DownloadArtifact, Presentation, ProgressSink, ProgressUpdate, RotateHandler, RotateRequest,
    RotatorConfig,
};
use crate::error::AppError;

pub const ROTATE_PROGRESS_EVENT: &str = "rotate-progress";

/// 将进度里程碑转发为前端事件。
struct EventProgressSink {
    app: AppHandle<Wry>,
}

impl ProgressSink for EventProgressSink {
    fn report(&mut self, update: &ProgressUpdate) {
        if let Err(err) = self.app.emit(ROTATE_PROGRESS_EVENT, update.clone()) {
            log::warn!("⚠️ 进度事件推送失败: {err}");
        }
    }
}

/// 图片旋转服务状态。
///
/// 作为 Tauri `State` 注入到命令层，内部持有 `RotateHandler`。
pub struct RotateServiceState {
    handler: Arc<Mutex<RotateHandler>>,
    guidelines: Vec<String>,
}

impl RotateServiceState {
    /// 使用自定义配置创建服务状态。
    pub fn with_config(config: RotatorConfig) -> Self {
        let guidelines = config.guidelines();
        Self {
            handler: Arc::new(Mutex::new(RotateHandler::with_config(config))),
            guidelines,
        }
    }

    /// 执行一次交互并推送进度事件。
    pub async fn run_with_progress(
        &self,
        app: &AppHandle<Wry>,
        request: RotateRequest,
    ) -> Result<Presentation, AppError> {
        let handler = Arc::clone(&self.handler);
        let mut sink = EventProgressSink { app: app.clone() };

        tokio::task::spawn_blocking(move || {
            let mut guard = handler
                .lock()
                .map_err(|_| AppError::State("旋转处理器锁已中毒".to_string()))?;
            Ok::<_, AppError>(guard.run(request, &mut sink))
        })
        .await
        .map_err(|e| AppError::State(format!("后台处理任务失败: {e}")))?
    }

    /// 最近一次成功结果的下载产物。
    pub fn last_download(&self) -> Result<Option<DownloadArtifact>, AppError> {
        self.handler
            .lock()
            .map(|guard| guard.last_download().cloned())
            .map_err(|_| AppError::State("旋转处理器锁已中毒".to_string()))
    }

    pub fn guidelines(&self) -> Vec<String> {
        self.guidelines.clone()
    }
}

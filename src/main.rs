// 防止在 Windows 发布版本中显示额外的控制台窗口，不要删除！
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! # 图片 180° 旋转工具 — 应用入口
//!
//! 本文件仅负责应用初始化与插件/命令注册。
//! 业务逻辑位于 `rotator` 模块，详见 `lib.rs` 架构文档。

use image_rotator::rotator::{self, RotateServiceState, RotatorConfig};
use tauri::Manager;

/// 应用配置目录下的配置文件名。
const CONFIG_FILE_NAME: &str = "rotator.json";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        // 插件初始化
        .plugin(tauri_plugin_dialog::init())
        // 应用设置
        .setup(|app| {
            log::info!("setup: begin");

            let config = match app.path().app_config_dir() {
                Ok(dir) => match RotatorConfig::load(dir.join(CONFIG_FILE_NAME)) {
                    Ok(config) => config,
                    Err(err) => {
                        log::error!("setup: 配置加载失败，使用默认配置: {err}");
                        RotatorConfig::default()
                    }
                },
                Err(err) => {
                    log::warn!("setup: 无法获取配置目录，使用默认配置: {err}");
                    RotatorConfig::default()
                }
            };

            app.manage(RotateServiceState::with_config(config));
            log::info!("setup: rotate service managed");

            Ok(())
        })
        // 注册所有 Tauri 命令
        .invoke_handler(tauri::generate_handler![
            rotator::commands::rotate_uploaded_image,
            rotator::commands::rotate_default_image,
            rotator::commands::get_image_guidelines,
            rotator::commands::save_rotated_image,
        ])
        .run(tauri::generate_context!())
        .expect("运行 Tauri 应用时出错");
}

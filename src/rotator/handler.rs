//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `RotateHandler` 只负责流程编排，不直接与 Tauri 绑定。
//! 处理链路固定为：
//! 1. 按来源加载原始字节（上传先做体积校验）
//! 2. 经注入的缓存执行解码 / 缩放 / 旋转
//! 3. 生成并排展示与下载产物
//!
//! ## 实现思路
//!
//! - 任何阶段的错误都在这里转换为 `Presentation::Failed` 并记录日志，
//!   不向调用方抛出，处理器可继续服务下一次交互。
//! - 找不到默认图片时返回上传提示，流水线不运行。
//! - 最近一次交互的下载产物随结果一起更新，失败或提示时清空，
//!   保证“另存为”写出的总是当前屏幕上的旋转结果。
//! - 记录 `load/process/display/total` 阶段耗时，便于性能诊断。

use std::time::Instant;

use super::cache::{CacheStats, TransformCache};
use super::loader::Loader;
use super::pipeline::Transformer;
use super::presenter::{self, DownloadArtifact, Presentation, ProgressSink, ProgressUpdate};
use super::source::{ImageBytes, RotateRequest, TransformResult};
use super::{RotatorConfig, RotatorError};

/// 图片旋转处理器。
pub struct RotateHandler {
    config: RotatorConfig,
    transformer: Transformer,
    cache: TransformCache,
    last_download: Option<DownloadArtifact>,
}

impl RotateHandler {
    /// 使用配置与外部创建的缓存构建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use image_rotator::rotator::{RotateHandler, RotatorConfig, TransformCache};
    ///
    /// let config = RotatorConfig::default();
    /// let cache = TransformCache::new(config.cache_capacity);
    /// let handler = RotateHandler::new(config, cache);
    /// assert_eq!(handler.cache_stats().misses, 0);
    /// ```
    pub fn new(config: RotatorConfig, cache: TransformCache) -> Self {
        Self {
            transformer: Transformer::new(config.clone()),
            config,
            cache,
            last_download: None,
        }
    }

    /// 按配置容量创建缓存。
    pub fn with_config(config: RotatorConfig) -> Self {
        let cache = TransformCache::new(config.cache_capacity);
        Self::new(config, cache)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// 最近一次交互产出的下载产物。
    pub fn last_download(&self) -> Option<&DownloadArtifact> {
        self.last_download.as_ref()
    }

    /// 处理一次交互，结果总是一个可展示的 `Presentation`。
    pub fn run(&mut self, request: RotateRequest, sink: &mut dyn ProgressSink) -> Presentation {
        let presentation = self.run_interaction(request, sink);
        self.last_download = presentation.rendered().map(|view| view.download.clone());
        presentation
    }

    fn run_interaction(
        &mut self,
        request: RotateRequest,
        sink: &mut dyn ProgressSink,
    ) -> Presentation {
        let total_start = Instant::now();

        let request = match self.resolve_request(request) {
            Ok(Some(request)) => request,
            Ok(None) => {
                log::info!("🖼️ 未上传图片且未找到默认图片，等待用户上传");
                return Presentation::upload_prompt();
            }
            Err(err) => return Self::fail(sink, &err),
        };

        match self.run_pipeline(request, sink, total_start) {
            Ok(presentation) => presentation,
            Err(err) => Self::fail(sink, &err),
        }
    }

    /// 对 `ImageBytes` 执行带缓存的变换。
    pub fn transform(&mut self, bytes: &ImageBytes) -> Result<TransformResult, RotatorError> {
        let transformer = &self.transformer;
        self.cache.get_or_try_insert(bytes, || transformer.transform(bytes))
    }

    /// 预检请求：上传超限立即失败；默认图片缺失时返回 `None`。
    fn resolve_request(
        &self,
        request: RotateRequest,
    ) -> Result<Option<RotateRequest>, RotatorError> {
        let loader = Loader::new(&self.config);
        match request {
            RotateRequest::Upload(upload) => {
                loader.check_upload_size(&upload)?;
                Ok(Some(RotateRequest::Upload(upload)))
            }
            RotateRequest::DefaultImage => match loader.locate_default() {
                Ok(path) => Ok(Some(RotateRequest::FilePath(path))),
                Err(RotatorError::MissingFile(_)) => Ok(None),
                Err(err) => Err(err),
            },
            RotateRequest::FilePath(path) => Ok(Some(RotateRequest::FilePath(path))),
        }
    }

    fn run_pipeline(
        &mut self,
        request: RotateRequest,
        sink: &mut dyn ProgressSink,
        total_start: Instant,
    ) -> Result<Presentation, RotatorError> {
        sink.report(&ProgressUpdate::loading());
        let load_start = Instant::now();
        let bytes = self.load(request)?;
        let load_elapsed = load_start.elapsed();

        sink.report(&ProgressUpdate::processing());
        let process_start = Instant::now();
        let result = self.transform(&bytes)?;
        let process_elapsed = process_start.elapsed();

        sink.report(&ProgressUpdate::displaying());
        let display_start = Instant::now();
        let mut view = presenter::render(&result, total_start.elapsed())?;
        let display_elapsed = display_start.elapsed();

        let total_elapsed = total_start.elapsed();
        view.elapsed_seconds = total_elapsed.as_secs_f64();
        sink.report(&ProgressUpdate::completed(total_elapsed));

        log::info!(
            "✅ 图片处理完成 - load={}ms process={}ms display={}ms total={}ms",
            load_elapsed.as_millis(),
            process_elapsed.as_millis(),
            display_elapsed.as_millis(),
            total_elapsed.as_millis()
        );

        Ok(Presentation::Rendered(view))
    }

    fn load(&self, request: RotateRequest) -> Result<ImageBytes, RotatorError> {
        let loader = Loader::new(&self.config);
        match request {
            RotateRequest::Upload(upload) => loader.load_upload(upload),
            RotateRequest::FilePath(path) => loader.load_file(&path),
            RotateRequest::DefaultImage => {
                let path = loader.locate_default()?;
                loader.load_file(&path)
            }
        }
    }

    fn fail(sink: &mut dyn ProgressSink, err: &RotatorError) -> Presentation {
        log::error!("❌ 图片处理失败 - code={} stage={}: {}", err.code(), err.stage(), err);
        sink.report(&ProgressUpdate::failed(err.to_string()));
        Presentation::failed(err)
    }
}

//! # 变换结果缓存
//!
//! 以完整输入字节为键的定长 LRU 缓存，由调用方创建并注入 `RotateHandler`，
//! 不再依赖进程级全局状态。容量满时淘汰最久未使用的条目。

use lru::LruCache;
use std::num::NonZeroUsize;

use super::source::{ImageBytes, TransformResult};

/// 缓存命中统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

pub struct TransformCache {
    entries: LruCache<ImageBytes, TransformResult>,
    hits: u64,
    misses: u64,
}

impl TransformCache {
    /// 创建指定容量的缓存，容量为 0 时按 1 处理。
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// 命中时返回缓存结果，否则调用 `compute` 计算并写入。
    ///
    /// 计算失败不会写入缓存，同样的输入下次仍会重新计算。
    pub fn get_or_try_insert<E>(
        &mut self,
        key: &ImageBytes,
        compute: impl FnOnce() -> Result<TransformResult, E>,
    ) -> Result<TransformResult, E> {
        if let Some(cached) = self.entries.get(key) {
            self.hits += 1;
            log::debug!("♻️ 命中变换缓存 - 输入体积: {}B", key.len());
            return Ok(cached.clone());
        }

        self.misses += 1;
        let result = compute()?;
        if let Some((evicted, _)) = self.entries.push(key.clone(), result.clone()) {
            if &evicted != key {
                log::debug!("🧹 变换缓存已满，淘汰最久未使用条目 - 体积: {}B", evicted.len());
            }
        }
        Ok(result)
    }

    pub fn contains(&self, key: &ImageBytes) -> bool {
        self.entries.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            len: self.entries.len(),
            capacity: self.entries.cap().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotator::RotatorError;
    use crate::rotator::source::Raster;
    use image::{DynamicImage, ImageBuffer, Rgb};
    use std::sync::Arc;

    fn sample_result(seed: u8) -> TransformResult {
        let img = ImageBuffer::from_fn(2, 2, |x, y| Rgb([seed, x as u8, y as u8]));
        let raster = Arc::new(
            Raster::from_image(DynamicImage::ImageRgb8(img)).expect("raster build failed"),
        );
        TransformResult {
            original: Arc::clone(&raster),
            transformed: raster,
        }
    }

    #[test]
    fn second_lookup_returns_same_shared_rasters() {
        let mut cache = TransformCache::new(4);
        let key = ImageBytes::from(vec![1, 2, 3]);

        let first = cache
            .get_or_try_insert::<RotatorError>(&key, || Ok(sample_result(1)))
            .expect("first insert failed");
        let second = cache
            .get_or_try_insert::<RotatorError>(&key, || panic!("must not recompute"))
            .expect("second lookup failed");

        assert!(Arc::ptr_eq(&first.original, &second.original));
        assert!(Arc::ptr_eq(&first.transformed, &second.transformed));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn least_recently_used_entry_is_evicted() {
        let mut cache = TransformCache::new(2);
        let a = ImageBytes::from(vec![1]);
        let b = ImageBytes::from(vec![2]);
        let c = ImageBytes::from(vec![3]);

        for (key, seed) in [(&a, 1), (&b, 2)] {
            cache
                .get_or_try_insert::<RotatorError>(key, || Ok(sample_result(seed)))
                .expect("insert failed");
        }
        // 访问 a，使 b 成为最久未使用。
        cache
            .get_or_try_insert::<RotatorError>(&a, || panic!("a should be cached"))
            .expect("lookup failed");
        cache
            .get_or_try_insert::<RotatorError>(&c, || Ok(sample_result(3)))
            .expect("insert failed");

        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.stats().len, 2);
    }

    #[test]
    fn failures_are_not_cached() {
        let mut cache = TransformCache::new(2);
        let key = ImageBytes::from(vec![9]);

        let result = cache.get_or_try_insert(&key, || {
            Err(RotatorError::Decode("bad bytes".to_string()))
        });

        assert!(result.is_err());
        assert!(!cache.contains(&key));
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        assert_eq!(TransformCache::new(0).stats().capacity, 1);
    }
}

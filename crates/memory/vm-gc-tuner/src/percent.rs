//! GC百分比计算
//!
//! 根据存活堆大小与内存上限之间的余量计算下一次回收前允许的增长比例。

use crate::{TunerError, TunerResult};

/// 默认最小GC百分比（已达上限时仍保持回收）
pub const MIN_GC_PERCENT: u32 = 30;

/// 默认最大GC百分比（内存压力很低时避免频繁回收）
pub const MAX_GC_PERCENT: u32 = 500;

/// 输入无效时使用的GC百分比
pub const DEFAULT_GC_PERCENT: u32 = 100;

/// GC百分比策略
///
/// `min` 是硬下限，`max` 是硬上限，`default` 在缺少信息时使用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GcPercentPolicy {
    min: u32,
    max: u32,
    default: u32,
}

impl Default for GcPercentPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl GcPercentPolicy {
    /// 内置默认策略
    pub const fn standard() -> Self {
        Self {
            min: MIN_GC_PERCENT,
            max: MAX_GC_PERCENT,
            default: DEFAULT_GC_PERCENT,
        }
    }

    /// 创建自定义策略
    ///
    /// # Errors
    ///
    /// `min` 为0、`min > max` 或 `default` 为0时返回 [`TunerError::InvalidConfig`]
    pub fn new(min: u32, max: u32, default: u32) -> TunerResult<Self> {
        if min == 0 {
            return Err(TunerError::invalid_config("min_gc_percent must be at least 1"));
        }
        if min > max {
            return Err(TunerError::invalid_config(format!(
                "min_gc_percent ({min}) exceeds max_gc_percent ({max})"
            )));
        }
        if default == 0 {
            return Err(TunerError::invalid_config(
                "default_gc_percent must be at least 1",
            ));
        }
        Ok(Self { min, max, default })
    }

    /// 下限
    pub fn min(&self) -> u32 {
        self.min
    }

    /// 上限
    pub fn max(&self) -> u32 {
        self.max
    }

    /// 默认值
    pub fn default_percent(&self) -> u32 {
        self.default
    }

    /// 百分比是否在 `[min, max]` 内
    pub fn contains(&self, percent: u32) -> bool {
        (self.min..=self.max).contains(&percent)
    }

    /// 计算GC百分比
    ///
    /// `floor((ceiling - live) * 100 / live)`，结果限制在 `[min, max]`。
    /// 任一输入为0时返回 `default`，`live >= ceiling` 时返回 `min`。
    pub fn calc(&self, live_bytes: u64, ceiling_bytes: u64) -> u32 {
        if live_bytes == 0 || ceiling_bytes == 0 {
            return self.default;
        }
        if live_bytes >= ceiling_bytes {
            return self.min;
        }

        let headroom = u128::from(ceiling_bytes - live_bytes);
        let percent = headroom * 100 / u128::from(live_bytes);
        let percent = u32::try_from(percent).unwrap_or(u32::MAX);
        percent.clamp(self.min, self.max)
    }
}

/// 使用内置默认策略计算GC百分比
pub fn calc_gc_percent(live_bytes: u64, ceiling_bytes: u64) -> u32 {
    GcPercentPolicy::standard().calc(live_bytes, ceiling_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GB: u64 = 1024 * 1024 * 1024;

    #[test]
    fn test_degenerate_inputs_use_default() {
        assert_eq!(calc_gc_percent(0, 0), DEFAULT_GC_PERCENT);
        assert_eq!(calc_gc_percent(0, 1), DEFAULT_GC_PERCENT);
        assert_eq!(calc_gc_percent(1, 0), DEFAULT_GC_PERCENT);
    }

    #[test]
    fn test_calc_gc_percent() {
        assert_eq!(calc_gc_percent(1, 3 * GB), MAX_GC_PERCENT);
        assert_eq!(calc_gc_percent(GB / 10, 4 * GB), MAX_GC_PERCENT);
        assert_eq!(calc_gc_percent(GB / 2, 4 * GB), MAX_GC_PERCENT);
        assert_eq!(calc_gc_percent(GB, 4 * GB), 300);
        assert_eq!(calc_gc_percent(GB + GB / 2, 4 * GB), 166);
        assert_eq!(calc_gc_percent(2 * GB, 4 * GB), 100);
        assert_eq!(calc_gc_percent(3 * GB, 4 * GB), 33);
        assert_eq!(calc_gc_percent(4 * GB, 4 * GB), MIN_GC_PERCENT);
        assert_eq!(calc_gc_percent(5 * GB, 4 * GB), MIN_GC_PERCENT);
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        // 2/3 * 100 = 66.67
        assert_eq!(calc_gc_percent(3, 5), 66);
    }

    #[test]
    fn test_huge_ceiling_does_not_overflow() {
        assert_eq!(calc_gc_percent(1, u64::MAX), MAX_GC_PERCENT);
        assert_eq!(calc_gc_percent(u64::MAX - 1, u64::MAX), MIN_GC_PERCENT);
    }

    #[test]
    fn test_custom_policy() {
        let policy = GcPercentPolicy::new(50, 200, 75).unwrap();
        assert_eq!(policy.calc(0, GB), 75);
        assert_eq!(policy.calc(GB, 4 * GB), 200);
        assert_eq!(policy.calc(3 * GB, 4 * GB), 50);
        assert_eq!(policy.calc(2 * GB, 4 * GB), 100);
        assert!(policy.contains(50));
        assert!(!policy.contains(201));
    }

    #[test]
    fn test_invalid_policy() {
        assert!(GcPercentPolicy::new(0, 100, 100).is_err());
        assert!(GcPercentPolicy::new(200, 100, 100).is_err());
        assert!(GcPercentPolicy::new(10, 100, 0).is_err());
        assert!(GcPercentPolicy::new(100, 100, 100).is_ok());
    }
}

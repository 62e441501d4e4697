//! GC调优器配置

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::percent::{DEFAULT_GC_PERCENT, GcPercentPolicy, MAX_GC_PERCENT, MIN_GC_PERCENT};
use crate::{TunerError, TunerResult};

/// 默认上限比例（内存预算的一半）
pub const DEFAULT_CEILING_RATIO: f64 = 0.5;

/// GC调优器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TunerConfig {
    /// 是否启用调优
    pub enable: bool,
    /// 总内存预算（字节）
    pub memory_limit_bytes: u64,
    /// 上限占内存预算的比例，取值 (0, 1]
    pub ceiling_ratio: f64,
    /// 显式指定的上限（字节），优先于比例
    pub ceiling_bytes: Option<u64>,
    /// 最小GC百分比
    pub min_gc_percent: u32,
    /// 最大GC百分比
    pub max_gc_percent: u32,
    /// 默认GC百分比
    pub default_gc_percent: u32,
    /// 轮询间隔（毫秒），0表示由回收完成钩子驱动
    pub poll_interval_ms: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            enable: true,
            memory_limit_bytes: 0,
            ceiling_ratio: DEFAULT_CEILING_RATIO,
            ceiling_bytes: None,
            min_gc_percent: MIN_GC_PERCENT,
            max_gc_percent: MAX_GC_PERCENT,
            default_gc_percent: DEFAULT_GC_PERCENT,
            poll_interval_ms: 0,
        }
    }
}

impl TunerConfig {
    /// 以内存预算创建配置，其余字段取默认值
    pub fn with_memory_limit(memory_limit_bytes: u64) -> Self {
        Self {
            memory_limit_bytes,
            ..Self::default()
        }
    }

    /// 从TOML文本解析
    ///
    /// # Errors
    ///
    /// 文本不是合法TOML或字段校验失败时返回错误
    pub fn from_toml_str(text: &str) -> TunerResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// 从TOML文件加载
    ///
    /// # Errors
    ///
    /// 文件无法读取、解析失败或校验失败时返回错误
    pub fn load(path: impl AsRef<Path>) -> TunerResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// 校验配置
    ///
    /// # Errors
    ///
    /// 比例不在 (0, 1] 内或百分比策略无效时返回 [`TunerError::InvalidConfig`]
    pub fn validate(&self) -> TunerResult<()> {
        if !self.ceiling_ratio.is_finite() || self.ceiling_ratio <= 0.0 || self.ceiling_ratio > 1.0
        {
            return Err(TunerError::invalid_config(format!(
                "ceiling_ratio must be in (0, 1], got {}",
                self.ceiling_ratio
            )));
        }
        self.policy().map(|_| ())
    }

    /// 计算内存上限（字节）
    ///
    /// 未配置内存预算且未显式指定上限时返回0，调优器将使用默认百分比。
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn ceiling_bytes(&self) -> u64 {
        match self.ceiling_bytes {
            Some(ceiling) => ceiling,
            None => (self.memory_limit_bytes as f64 * self.ceiling_ratio).floor() as u64,
        }
    }

    /// 百分比策略
    ///
    /// # Errors
    ///
    /// 见 [`GcPercentPolicy::new`]
    pub fn policy(&self) -> TunerResult<GcPercentPolicy> {
        GcPercentPolicy::new(
            self.min_gc_percent,
            self.max_gc_percent,
            self.default_gc_percent,
        )
    }

    /// 轮询间隔，`None` 表示由钩子驱动
    pub fn poll_interval(&self) -> Option<Duration> {
        (self.poll_interval_ms > 0).then(|| Duration::from_millis(self.poll_interval_ms))
    }
}

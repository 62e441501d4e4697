//! GC调优器
//!
//! 每次回收完成后读取存活堆大小，重新计算GC百分比并写回收集器。
//! 计算和写回在同一个 `try_lock` 临界区内完成，回调路径从不阻塞：
//! 抢不到锁的回调只留下待处理标记，由持锁方重新采样。

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use vm_gc::{CollectorHost, HookId};

use crate::{GcPercentPolicy, TunerConfig, TunerError, TunerResult};

/// 调优统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerStats {
    /// 收到的回收完成通知次数
    pub cycles_observed: u64,
    /// 实际执行计算的次数（启用状态下）
    pub samples: u64,
    /// 百分比发生变化的次数
    pub adjustments: u64,
    /// 最近一次采样的存活字节数
    pub last_live_bytes: u64,
}

/// GC调优器
///
/// 持有收集器的GC百分比这一进程级旋钮。同一收集器上同一时刻只应安装一个调优器。
pub struct GcTuner {
    /// 收集器宿主
    host: Arc<dyn CollectorHost>,
    /// 百分比策略
    policy: GcPercentPolicy,
    /// 内存上限（字节），0表示未配置
    ceiling_bytes: AtomicU64,
    /// 最近一次应用的百分比
    gc_percent: AtomicU32,
    /// 是否启用
    enabled: AtomicBool,
    /// 已注册的钩子
    hook: Mutex<Option<HookId>>,
    /// 采样、计算、写回的临界区
    apply: Mutex<()>,
    /// 有尚未处理的回收完成通知
    pending: AtomicBool,
    cycles_observed: AtomicU64,
    samples: AtomicU64,
    adjustments: AtomicU64,
    last_live_bytes: AtomicU64,
}

impl GcTuner {
    /// 使用默认策略创建调优器
    pub fn new(host: Arc<dyn CollectorHost>, ceiling_bytes: u64) -> Self {
        Self::with_policy(host, ceiling_bytes, GcPercentPolicy::standard())
    }

    /// 使用指定策略创建调优器
    pub fn with_policy(
        host: Arc<dyn CollectorHost>,
        ceiling_bytes: u64,
        policy: GcPercentPolicy,
    ) -> Self {
        Self {
            host,
            policy,
            ceiling_bytes: AtomicU64::new(ceiling_bytes),
            gc_percent: AtomicU32::new(policy.default_percent()),
            enabled: AtomicBool::new(true),
            hook: Mutex::new(None),
            apply: Mutex::new(()),
            pending: AtomicBool::new(false),
            cycles_observed: AtomicU64::new(0),
            samples: AtomicU64::new(0),
            adjustments: AtomicU64::new(0),
            last_live_bytes: AtomicU64::new(0),
        }
    }

    /// 根据配置创建调优器
    ///
    /// # Errors
    ///
    /// 配置校验失败时返回 [`TunerError::InvalidConfig`]
    pub fn from_config(host: Arc<dyn CollectorHost>, config: &TunerConfig) -> TunerResult<Self> {
        config.validate()?;
        let tuner = Self::with_policy(host, config.ceiling_bytes(), config.policy()?);
        tuner.enabled.store(config.enable, Ordering::Release);
        Ok(tuner)
    }

    /// 设置或替换内存上限
    pub fn configure(&self, ceiling_bytes: u64) {
        let previous = self.ceiling_bytes.swap(ceiling_bytes, Ordering::AcqRel);
        if previous != ceiling_bytes {
            log::info!("gc tuner ceiling changed: {previous} -> {ceiling_bytes} bytes");
        }
        if ceiling_bytes == 0 {
            log::warn!(
                "gc tuner ceiling is 0, falling back to GC percent {}",
                self.policy.default_percent()
            );
        }
    }

    /// 当前内存上限
    pub fn ceiling_bytes(&self) -> u64 {
        self.ceiling_bytes.load(Ordering::Acquire)
    }

    /// 回收完成回调
    ///
    /// 禁用时直接返回。可以并发或重复调用：同一时刻只有一个回调在写百分比，
    /// 其余回调标记待处理后立即返回，持锁方退出前会用最新的存活堆重新计算，
    /// 因此收集器上的百分比和 [`gc_percent`](Self::gc_percent) 始终一致。
    pub fn on_collection_completed(&self) {
        self.cycles_observed.fetch_add(1, Ordering::Relaxed);
        if !self.enabled.load(Ordering::Acquire) {
            return;
        }

        self.pending.store(true, Ordering::Release);
        loop {
            let Some(guard) = self.apply.try_lock() else {
                return;
            };
            while self.pending.swap(false, Ordering::AcqRel) {
                if !self.enabled.load(Ordering::Acquire) {
                    return;
                }
                self.apply_sample();
            }
            drop(guard);

            // 释放锁之前到达的通知可能没有被处理
            if !self.pending.load(Ordering::Acquire) {
                return;
            }
        }
    }

    /// 采样并写回，调用方持有 `apply`
    fn apply_sample(&self) {
        let live_bytes = self.host.live_heap_bytes();
        let ceiling_bytes = self.ceiling_bytes.load(Ordering::Acquire);
        let percent = self.policy.calc(live_bytes, ceiling_bytes);

        self.last_live_bytes.store(live_bytes, Ordering::Relaxed);
        self.samples.fetch_add(1, Ordering::Relaxed);

        self.host.set_gc_percent(percent);
        let previous = self.gc_percent.swap(percent, Ordering::AcqRel);

        if previous != percent {
            self.adjustments.fetch_add(1, Ordering::Relaxed);
            log::debug!(
                "gc percent {previous} -> {percent} (live={live_bytes}, ceiling={ceiling_bytes})"
            );
        }
    }

    /// 最近一次应用的GC百分比，不触发重新计算
    pub fn gc_percent(&self) -> u32 {
        self.gc_percent.load(Ordering::Acquire)
    }

    /// 启用/禁用调优，禁用时保留最后的百分比
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.swap(enabled, Ordering::AcqRel) != enabled {
            log::info!(
                "gc tuner {} at GC percent {}",
                if enabled { "enabled" } else { "disabled" },
                self.gc_percent()
            );
        }
    }

    /// 是否启用
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// 百分比策略
    pub fn policy(&self) -> GcPercentPolicy {
        self.policy
    }

    /// 获取统计信息
    pub fn stats(&self) -> TunerStats {
        TunerStats {
            cycles_observed: self.cycles_observed.load(Ordering::Relaxed),
            samples: self.samples.load(Ordering::Relaxed),
            adjustments: self.adjustments.load(Ordering::Relaxed),
            last_live_bytes: self.last_live_bytes.load(Ordering::Relaxed),
        }
    }

    /// 在收集器上注册回收完成钩子
    ///
    /// 钩子只持有弱引用，调优器被释放后钩子自动失效。
    ///
    /// # Errors
    ///
    /// 已安装时返回 [`TunerError::AlreadyInstalled`]，宿主拒绝注册时返回 [`TunerError::Gc`]
    pub fn install(self: &Arc<Self>) -> TunerResult<()> {
        let mut slot = self.hook.lock();
        if slot.is_some() {
            return Err(TunerError::AlreadyInstalled);
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let id = self.host.register_cycle_hook(Arc::new(move || {
            if let Some(tuner) = weak.upgrade() {
                tuner.on_collection_completed();
            }
        }))?;
        *slot = Some(id);

        log::info!(
            "gc tuner installed on {} collector (ceiling={} bytes, percent range {}..={})",
            self.host.name(),
            self.ceiling_bytes(),
            self.policy.min(),
            self.policy.max()
        );
        Ok(())
    }

    /// 注销回收完成钩子，返回之前是否已安装
    pub fn uninstall(&self) -> bool {
        let Some(id) = self.hook.lock().take() else {
            return false;
        };
        if let Err(err) = self.host.unregister_cycle_hook(id) {
            log::warn!("gc tuner hook {id} was already gone: {err}");
        }
        true
    }

    /// 是否已安装
    pub fn is_installed(&self) -> bool {
        self.hook.lock().is_some()
    }
}

impl Drop for GcTuner {
    fn drop(&mut self) {
        if let Some(id) = self.hook.get_mut().take() {
            let _ = self.host.unregister_cycle_hook(id);
        }
    }
}

impl std::fmt::Debug for GcTuner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcTuner")
            .field("host", &self.host.name())
            .field("policy", &self.policy)
            .field("ceiling_bytes", &self.ceiling_bytes())
            .field("gc_percent", &self.gc_percent())
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vm_gc::SimulatedCollector;

    const MIB: u64 = 1024 * 1024;

    fn setup(ceiling: u64) -> (Arc<SimulatedCollector>, Arc<GcTuner>) {
        let gc = Arc::new(SimulatedCollector::new());
        let tuner = Arc::new(GcTuner::new(gc.clone(), ceiling));
        (gc, tuner)
    }

    #[test]
    fn test_tuner_creation() {
        let (_gc, tuner) = setup(50 * MIB);
        assert_eq!(tuner.ceiling_bytes(), 50 * MIB);
        assert_eq!(tuner.gc_percent(), crate::DEFAULT_GC_PERCENT);
        assert!(tuner.is_enabled());
        assert!(!tuner.is_installed());
    }

    #[test]
    fn test_callback_applies_percent_to_host() {
        let (gc, tuner) = setup(4 * MIB);
        gc.set_live_bytes(MIB);
        tuner.on_collection_completed();

        assert_eq!(tuner.gc_percent(), 300);
        assert_eq!(gc.gc_percent(), 300);
        let stats = tuner.stats();
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.adjustments, 1);
        assert_eq!(stats.last_live_bytes, MIB);
    }

    #[test]
    fn test_zero_ceiling_forces_default() {
        let (gc, tuner) = setup(4 * MIB);
        gc.set_live_bytes(MIB);
        tuner.on_collection_completed();
        assert_eq!(tuner.gc_percent(), 300);

        tuner.configure(0);
        tuner.on_collection_completed();
        assert_eq!(tuner.gc_percent(), crate::DEFAULT_GC_PERCENT);
    }

    #[test]
    fn test_disabled_callback_is_noop() {
        let (gc, tuner) = setup(4 * MIB);
        tuner.set_enabled(false);
        gc.set_live_bytes(MIB);
        gc.set_gc_percent(77);
        tuner.on_collection_completed();

        assert_eq!(tuner.gc_percent(), crate::DEFAULT_GC_PERCENT);
        assert_eq!(gc.gc_percent(), 77);
        assert_eq!(tuner.stats().cycles_observed, 1);
        assert_eq!(tuner.stats().samples, 0);
    }

    #[test]
    fn test_install_twice() {
        let (gc, tuner) = setup(4 * MIB);
        tuner.install().unwrap();
        assert!(matches!(tuner.install(), Err(TunerError::AlreadyInstalled)));
        assert_eq!(gc.hook_count(), 1);

        assert!(tuner.uninstall());
        assert!(!tuner.uninstall());
        assert_eq!(gc.hook_count(), 0);
    }

    #[test]
    fn test_drop_unregisters_hook() {
        let (gc, tuner) = setup(4 * MIB);
        tuner.install().unwrap();
        assert_eq!(gc.hook_count(), 1);

        drop(tuner);
        assert_eq!(gc.hook_count(), 0);
        gc.collect();
    }

    #[test]
    fn test_from_config() {
        let gc = Arc::new(SimulatedCollector::new());
        let config = TunerConfig {
            enable: false,
            min_gc_percent: 50,
            ..TunerConfig::with_memory_limit(100 * MIB)
        };
        let tuner = GcTuner::from_config(gc, &config).unwrap();

        assert!(!tuner.is_enabled());
        assert_eq!(tuner.ceiling_bytes(), 50 * MIB);
        assert_eq!(tuner.policy().min(), 50);
    }
}

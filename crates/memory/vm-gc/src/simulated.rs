//! 模拟收集器
//!
//! 进程内的GC节奏模型。上次回收后存活的字节数乘以 (100 + percent) / 100
//! 得到下一次回收的堆目标，堆占用达到目标时执行回收，回收完成后依次触发
//! 已注册的周期钩子。

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::{CollectorHost, CycleHook, GcError, GcResult, GcStats, HookId};

/// 堆目标下限（4MB）
pub const MIN_HEAP_GOAL: u64 = 4 * 1024 * 1024;

/// 初始GC百分比
pub const INITIAL_GC_PERCENT: u32 = 100;

/// 模拟收集器
pub struct SimulatedCollector {
    /// 可达字节数
    live_bytes: AtomicU64,
    /// 等待回收的垃圾字节数
    garbage_bytes: AtomicU64,
    /// 上次回收时标记的存活字节数
    marked_bytes: AtomicU64,
    /// 存活字节峰值
    peak_live_bytes: AtomicU64,
    /// 当前增长目标
    gc_percent: AtomicU32,
    /// 周期钩子
    hooks: RwLock<Vec<(HookId, CycleHook)>>,
    /// 下一个钩子ID
    next_hook_id: AtomicU64,
    /// 是否已关闭
    closed: AtomicBool,
    /// 统计信息
    stats: Mutex<GcStats>,
}

impl Default for SimulatedCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCollector {
    /// 创建新的模拟收集器
    pub fn new() -> Self {
        Self::with_gc_percent(INITIAL_GC_PERCENT)
    }

    /// 使用指定的初始百分比创建
    pub fn with_gc_percent(percent: u32) -> Self {
        Self {
            live_bytes: AtomicU64::new(0),
            garbage_bytes: AtomicU64::new(0),
            marked_bytes: AtomicU64::new(0),
            peak_live_bytes: AtomicU64::new(0),
            gc_percent: AtomicU32::new(percent),
            hooks: RwLock::new(Vec::new()),
            next_hook_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
            stats: Mutex::new(GcStats::default()),
        }
    }

    /// 分配短命对象，返回是否触发了回收
    pub fn allocate(&self, bytes: u64) -> bool {
        self.garbage_bytes.fetch_add(bytes, Ordering::AcqRel);
        self.stats.lock().record_allocation(bytes);
        self.maybe_collect()
    }

    /// 分配并保留对象，返回是否触发了回收
    pub fn retain(&self, bytes: u64) -> bool {
        let live = self.live_bytes.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.peak_live_bytes.fetch_max(live, Ordering::AcqRel);
        self.stats.lock().record_allocation(bytes);
        self.maybe_collect()
    }

    /// 释放已保留的对象，下次回收时归还
    pub fn release(&self, bytes: u64) {
        let released = self
            .live_bytes
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                Some(live.saturating_sub(bytes))
            })
            .map_or(0, |live| live.min(bytes));
        self.garbage_bytes.fetch_add(released, Ordering::AcqRel);
    }

    /// 直接设置存活字节数，不计入分配统计
    pub fn set_live_bytes(&self, bytes: u64) {
        self.live_bytes.store(bytes, Ordering::Release);
        self.peak_live_bytes.fetch_max(bytes, Ordering::AcqRel);
    }

    /// 当前堆占用（存活 + 垃圾）
    pub fn heap_in_use(&self) -> u64 {
        self.live_bytes
            .load(Ordering::Acquire)
            .saturating_add(self.garbage_bytes.load(Ordering::Acquire))
    }

    /// 下一次回收的堆目标
    pub fn heap_goal(&self) -> u64 {
        let marked = u128::from(self.marked_bytes.load(Ordering::Acquire));
        let percent = u128::from(self.gc_percent.load(Ordering::Acquire));
        let goal = marked * (100 + percent) / 100;
        u64::try_from(goal).unwrap_or(u64::MAX).max(MIN_HEAP_GOAL)
    }

    fn maybe_collect(&self) -> bool {
        if self.heap_in_use() >= self.heap_goal() {
            self.collect();
            true
        } else {
            false
        }
    }

    /// 执行一次回收并触发周期钩子
    pub fn collect(&self) {
        let start = Instant::now();
        let freed = self.garbage_bytes.swap(0, Ordering::AcqRel);
        let live = self.live_bytes.load(Ordering::Acquire);
        self.marked_bytes.store(live, Ordering::Release);
        self.stats.lock().record_collection(start.elapsed(), freed);
        log::trace!("{} cycle done: live={live} freed={freed}", self.name());

        // 先复制钩子列表再调用，钩子内部可以回调本收集器
        let hooks: Vec<CycleHook> = self.hooks.read().iter().map(|(_, h)| h.clone()).collect();
        for hook in hooks {
            hook();
        }
    }

    /// 关闭收集器，之后不再接受钩子注册
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.hooks.write().clear();
        log::debug!("{} closed", self.name());
    }

    /// 是否已关闭
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// 已注册的钩子数量
    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    /// 获取统计信息
    pub fn stats(&self) -> GcStats {
        let mut stats = self.stats.lock().clone();
        stats.live_heap_bytes = self.live_bytes.load(Ordering::Acquire);
        stats.peak_live_bytes = self.peak_live_bytes.load(Ordering::Acquire);
        stats.gc_percent = self.gc_percent.load(Ordering::Acquire);
        stats
    }
}

impl CollectorHost for SimulatedCollector {
    fn register_cycle_hook(&self, hook: CycleHook) -> GcResult<HookId> {
        if self.is_closed() {
            return Err(GcError::HostClosed);
        }
        let id = self.next_hook_id.fetch_add(1, Ordering::Relaxed);
        self.hooks.write().push((id, hook));
        Ok(id)
    }

    fn unregister_cycle_hook(&self, id: HookId) -> GcResult<()> {
        let mut hooks = self.hooks.write();
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        if hooks.len() == before {
            return Err(GcError::HookNotFound(id));
        }
        Ok(())
    }

    fn live_heap_bytes(&self) -> u64 {
        self.live_bytes.load(Ordering::Acquire)
    }

    fn set_gc_percent(&self, percent: u32) -> u32 {
        self.gc_percent.swap(percent, Ordering::AcqRel)
    }

    fn gc_percent(&self) -> u32 {
        self.gc_percent.load(Ordering::Acquire)
    }

    fn name(&self) -> &str {
        "simulated"
    }
}

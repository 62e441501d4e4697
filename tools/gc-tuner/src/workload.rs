//! 合成负载
//!
//! 四个阶段：空闲、逐步增长到上限的1.2倍、稳定、逐步释放。
//! 每一步都会分配短命对象推动模拟收集器回收。

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use vm_gc::{CollectorHost, SimulatedCollector};
use vm_gc_tuner::GcTuner;
use vm_monitor::ProgressTracker;

const MIN_CHUNK: u64 = 64 * 1024;
const PIECES_PER_STEP: u64 = 4;

/// 负载阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    /// 几乎没有存活对象
    Idle,
    /// 存活对象增长到上限之上
    RampUp,
    /// 存活对象保持不变
    Steady,
    /// 释放存活对象
    RampDown,
}

impl Phase {
    /// 全部阶段，按执行顺序
    pub const ALL: [Phase; 4] = [Phase::Idle, Phase::RampUp, Phase::Steady, Phase::RampDown];
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::RampUp => write!(f, "ramp-up"),
            Phase::Steady => write!(f, "steady"),
            Phase::RampDown => write!(f, "ramp-down"),
        }
    }
}

/// 单个阶段的统计
#[derive(Debug, Clone, Serialize)]
pub struct PhaseReport {
    /// 阶段
    pub phase: Phase,
    /// 本阶段的回收次数
    pub collections: u64,
    /// 阶段结束时的GC百分比
    pub gc_percent: u32,
    /// 阶段结束时的存活字节数
    pub live_bytes: u64,
    /// 累计存活字节峰值
    pub peak_live_bytes: u64,
    /// 本阶段百分比调整次数
    pub adjustments: u64,
    /// 分配速度（字节/秒）
    pub allocated_bps: u64,
}

/// 合成负载
pub struct Workload {
    gc: Arc<SimulatedCollector>,
    tuner: Arc<GcTuner>,
    steps: u64,
    ceiling: u64,
    poll_interval: Option<Duration>,
}

impl Workload {
    /// 创建负载
    pub fn new(
        gc: Arc<SimulatedCollector>,
        tuner: Arc<GcTuner>,
        steps: u64,
        poll_interval: Option<Duration>,
    ) -> Self {
        let ceiling = tuner.ceiling_bytes();
        Self {
            gc,
            tuner,
            steps: steps.max(1),
            ceiling,
            poll_interval,
        }
    }

    fn chunk(&self) -> u64 {
        (self.ceiling / 16).max(MIN_CHUNK)
    }

    fn retain_per_step(&self) -> u64 {
        ((self.ceiling / 10).saturating_mul(12) / self.steps).max(1)
    }

    /// 依次运行所有阶段
    pub async fn run(&self) -> Vec<PhaseReport> {
        let progress = ProgressTracker::new(self.steps.saturating_mul(Phase::ALL.len() as u64));
        let mut reports = Vec::with_capacity(Phase::ALL.len());

        self.gc.set_live_bytes(1024 * 1024);
        for phase in Phase::ALL {
            let before_gc = self.gc.stats();
            let before_tuner = self.tuner.stats();

            for _ in 0..self.steps {
                self.step(phase, &progress);
                match self.poll_interval {
                    Some(interval) => tokio::time::sleep(interval).await,
                    None => tokio::task::yield_now().await,
                }
            }

            let after_gc = self.gc.stats();
            let report = PhaseReport {
                phase,
                collections: after_gc.collections - before_gc.collections,
                gc_percent: self.gc.gc_percent(),
                live_bytes: after_gc.live_heap_bytes,
                peak_live_bytes: after_gc.peak_live_bytes,
                adjustments: self.tuner.stats().adjustments - before_tuner.adjustments,
                allocated_bps: progress.status().current_speed_bps,
            };
            log::info!(
                "phase {} done: collections={} gc_percent={} live={}",
                report.phase,
                report.collections,
                report.gc_percent,
                report.live_bytes
            );
            reports.push(report);
        }
        reports
    }

    fn step(&self, phase: Phase, progress: &ProgressTracker) {
        let mut allocated = 0;
        match phase {
            Phase::RampUp => {
                let bytes = self.retain_per_step();
                self.gc.retain(bytes);
                allocated += bytes;
            }
            Phase::RampDown => self.gc.release(self.retain_per_step()),
            Phase::Idle | Phase::Steady => {}
        }

        let piece = self.chunk() / PIECES_PER_STEP;
        for _ in 0..PIECES_PER_STEP {
            self.gc.allocate(piece);
            allocated += piece;
        }

        progress.add_finished_bytes(allocated);
        progress.complete_unit();
    }
}

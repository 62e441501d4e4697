//! 进度状态
//!
//! 长时间任务的完成量计数器和只读快照，供周期性的进度报告读取。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::SpeedRecorder;

/// 进度快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStatus {
    /// 已完成单元数
    pub completed_units: u64,
    /// 总单元数
    pub total_units: u64,
    /// 已完成字节数
    pub finished_bytes: u64,
    /// 当前速度（字节/秒）
    pub current_speed_bps: u64,
}

impl ProgressStatus {
    /// 完成百分比（0.0-100.0），总量为0时返回0
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_percent(&self) -> f64 {
        if self.total_units == 0 {
            return 0.0;
        }
        self.completed_units as f64 / self.total_units as f64 * 100.0
    }
}

/// 进度跟踪器
#[derive(Debug, Default)]
pub struct ProgressTracker {
    completed_units: AtomicU64,
    total_units: AtomicU64,
    finished_bytes: AtomicU64,
    speed: SpeedRecorder,
}

impl ProgressTracker {
    /// 创建新的跟踪器
    pub fn new(total_units: u64) -> Self {
        let tracker = Self::default();
        tracker.set_total_units(total_units);
        tracker
    }

    /// 设置总单元数
    pub fn set_total_units(&self, total: u64) {
        self.total_units.store(total, Ordering::Release);
    }

    /// 完成一个单元
    pub fn complete_unit(&self) {
        self.completed_units.fetch_add(1, Ordering::AcqRel);
    }

    /// 增加已完成字节数
    pub fn add_finished_bytes(&self, bytes: u64) {
        self.finished_bytes.fetch_add(bytes, Ordering::AcqRel);
    }

    /// 读取当前状态，同时把已完成字节数交给速度记录器
    pub fn status(&self) -> ProgressStatus {
        let finished_bytes = self.finished_bytes.load(Ordering::Acquire);
        ProgressStatus {
            completed_units: self.completed_units.load(Ordering::Acquire),
            total_units: self.total_units.load(Ordering::Acquire),
            finished_bytes,
            current_speed_bps: self.speed.record_cumulative(finished_bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_status_snapshot() {
        let tracker = ProgressTracker::new(4);
        tracker.complete_unit();
        tracker.add_finished_bytes(1024);

        let status = tracker.status();
        assert_eq!(status.completed_units, 1);
        assert_eq!(status.total_units, 4);
        assert_eq!(status.finished_bytes, 1024);
        assert!(status.current_speed_bps >= 1);
        assert_eq!(status.completion_percent(), 25.0);
    }

    #[test]
    fn test_idle_tracker_reports_zero_speed() {
        let tracker = ProgressTracker::new(0);
        let status = tracker.status();
        assert_eq!(status.current_speed_bps, 0);
        assert_eq!(status.completion_percent(), 0.0);
    }

    #[test]
    fn test_stalled_progress_keeps_speed() {
        let tracker = ProgressTracker::new(1);
        tracker.add_finished_bytes(4096);
        let first = tracker.status().current_speed_bps;
        let second = tracker.status().current_speed_bps;
        assert_eq!(first, second);
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(ProgressTracker::new(400));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tracker = tracker.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.complete_unit();
                        tracker.add_finished_bytes(10);
                        let _ = tracker.status();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let status = tracker.status();
        assert_eq!(status.completed_units, 400);
        assert_eq!(status.finished_bytes, 4000);
    }

    #[test]
    fn test_status_serialize() {
        let tracker = ProgressTracker::new(2);
        tracker.complete_unit();
        let json = serde_json::to_string(&tracker.status()).unwrap();
        assert!(json.contains("\"completed_units\":1"));
        assert!(json.contains("\"total_units\":2"));
    }
}

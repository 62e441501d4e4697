//! # vm-monitor - 任务进度监控
//!
//! 长时间运行的任务（导出、迁移等）的进度计数和吞吐估算。
//!
//! ## 主要功能
//!
//! - **速度估算**: [`SpeedRecorder`] 根据累计完成量计算每秒速度
//! - **进度快照**: [`ProgressTracker::status`] 返回完成单元、总单元、已完成字节与当前速度

#![warn(missing_docs)]

pub mod speed;
pub mod status;

pub use speed::SpeedRecorder;
pub use status::{ProgressStatus, ProgressTracker};

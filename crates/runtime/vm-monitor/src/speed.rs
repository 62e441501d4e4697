//! 吞吐速度估算
//!
//! 根据累计完成量估算每秒速度。累计量没有前进时沿用上一次的速度，
//! 避免停滞但仍在运行的任务显示为0。

use std::time::Instant;

use parking_lot::Mutex;

#[derive(Debug)]
struct SpeedState {
    last_finished: u64,
    last_update: Instant,
    speed: u64,
}

/// 速度记录器
#[derive(Debug)]
pub struct SpeedRecorder {
    state: Mutex<SpeedState>,
}

impl Default for SpeedRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedRecorder {
    /// 创建新的速度记录器，计时从现在开始
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// 以指定时刻为起点创建
    pub fn starting_at(start: Instant) -> Self {
        Self {
            state: Mutex::new(SpeedState {
                last_finished: 0,
                last_update: start,
                speed: 0,
            }),
        }
    }

    /// 记录累计完成量，返回当前速度（单位/秒）
    pub fn record_cumulative(&self, finished: u64) -> u64 {
        self.record_cumulative_at(finished, Instant::now())
    }

    /// 在指定时刻记录累计完成量
    ///
    /// 耗时按整秒向下取整且至少为1秒；有进展时速度至少为1。
    pub fn record_cumulative_at(&self, finished: u64, now: Instant) -> u64 {
        let mut state = self.state.lock();
        if finished <= state.last_finished {
            return state.speed;
        }

        let elapsed = now
            .saturating_duration_since(state.last_update)
            .as_secs()
            .max(1);
        let speed = ((finished - state.last_finished) / elapsed).max(1);

        state.last_finished = finished;
        state.last_update = now;
        state.speed = speed;
        speed
    }

    /// 当前速度，不记录新数据
    pub fn speed(&self) -> u64 {
        self.state.lock().speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_initial_speed_is_zero() {
        let recorder = SpeedRecorder::new();
        assert_eq!(recorder.speed(), 0);
        assert_eq!(recorder.record_cumulative(0), 0);
    }

    #[test]
    fn test_same_value_returns_same_speed() {
        let start = Instant::now();
        let recorder = SpeedRecorder::starting_at(start);
        let first = recorder.record_cumulative_at(1000, start + Duration::from_secs(2));
        let second = recorder.record_cumulative_at(1000, start + Duration::from_secs(5));

        assert_eq!(first, 500);
        assert_eq!(second, first);
    }

    #[test]
    fn test_regressing_value_keeps_speed() {
        let start = Instant::now();
        let recorder = SpeedRecorder::starting_at(start);
        recorder.record_cumulative_at(300, start + Duration::from_secs(3));
        assert_eq!(recorder.record_cumulative_at(100, start + Duration::from_secs(4)), 100);
    }

    #[test]
    fn test_converges_to_interval_delta() {
        let start = Instant::now();
        let recorder = SpeedRecorder::starting_at(start);
        let mut speed = 0;
        for i in 1..=10u64 {
            speed = recorder.record_cumulative_at(i * 4096, start + Duration::from_secs(i));
        }
        assert_eq!(speed, 4096);
    }

    #[test]
    fn test_sub_second_elapsed_counts_as_one_second() {
        let start = Instant::now();
        let recorder = SpeedRecorder::starting_at(start);
        let speed = recorder.record_cumulative_at(700, start + Duration::from_millis(10));
        assert_eq!(speed, 700);
    }

    #[test]
    fn test_slow_progress_floors_at_one() {
        let start = Instant::now();
        let recorder = SpeedRecorder::starting_at(start);
        let speed = recorder.record_cumulative_at(5, start + Duration::from_secs(60));
        assert_eq!(speed, 1);
    }
}

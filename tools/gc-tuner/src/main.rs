//! gc-tuner-sim - GC调优器模拟
//!
//! 在模拟收集器上运行合成负载，观察调优器如何随存活堆变化调整GC百分比。

mod cli;
mod workload;

use std::sync::Arc;

use anyhow::Result;
use vm_gc::SimulatedCollector;
use vm_gc_tuner::{GcTuner, PollingDriver};

use crate::workload::{PhaseReport, Workload};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let invocation = cli::resolve(&cli::command().get_matches())?;
    let config = &invocation.config;

    let gc = Arc::new(SimulatedCollector::new());
    let tuner = Arc::new(GcTuner::from_config(gc.clone(), config)?);

    let poller = match config.poll_interval() {
        Some(interval) => Some(PollingDriver::spawn(tuner.clone(), interval)),
        None => {
            tuner.install()?;
            None
        }
    };

    let workload = Workload::new(
        gc.clone(),
        tuner.clone(),
        invocation.steps,
        config.poll_interval(),
    );
    let reports = workload.run().await;

    if let Some(poller) = poller {
        poller.shutdown().await;
    }
    tuner.uninstall();

    if invocation.json {
        let summary = serde_json::json!({
            "ceiling_bytes": tuner.ceiling_bytes(),
            "tuner": tuner.stats(),
            "collector": gc.stats(),
            "phases": reports,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_table(tuner.ceiling_bytes(), &reports);
    }

    Ok(())
}

fn print_table(ceiling_bytes: u64, reports: &[PhaseReport]) {
    println!("ceiling: {} MiB", ceiling_bytes / (1024 * 1024));
    println!(
        "{:<10} {:>11} {:>10} {:>10} {:>10} {:>11} {:>12}",
        "phase", "collections", "gc_percent", "live_mib", "peak_mib", "adjustments", "alloc_mib/s"
    );
    for report in reports {
        println!(
            "{:<10} {:>11} {:>10} {:>10} {:>10} {:>11} {:>12}",
            report.phase.to_string(),
            report.collections,
            report.gc_percent,
            report.live_bytes / (1024 * 1024),
            report.peak_live_bytes / (1024 * 1024),
            report.adjustments,
            report.allocated_bps / (1024 * 1024),
        );
    }
}

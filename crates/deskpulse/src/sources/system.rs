use deskpulse_core::{SourceError, SystemSnapshot};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::System;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::trace;

const CPU_SAMPLE_WINDOW: Duration = Duration::from_millis(200);
const GPU_QUERY: [&str; 2] = ["--query-gpu=utilization.gpu", "--format=csv,noheader,nounits"];

pub struct SystemProbe {
    system: Arc<Mutex<System>>,
}

impl SystemProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // Baseline so the first windowed sample has a delta to work from.
        system.refresh_cpu_usage();
        Self {
            system: Arc::new(Mutex::new(system)),
        }
    }

    pub async fn sample(&self) -> Result<SystemSnapshot, SourceError> {
        let (cpu, mem) = {
            let mut system = self.system.lock().await;
            system.refresh_cpu_usage();
            tokio::time::sleep(CPU_SAMPLE_WINDOW).await;
            system.refresh_cpu_usage();
            system.refresh_memory();
            let cpu = average_usage(system.cpus().iter().map(|cpu| cpu.cpu_usage()));
            let mem = used_percent(system.used_memory(), system.total_memory());
            (cpu, mem)
        };
        let gpu = query_gpu().await;
        Ok(SystemSnapshot::new(cpu, mem, gpu))
    }
}

fn average_usage(readings: impl Iterator<Item = f32>) -> f64 {
    let (sum, count) = readings.fold((0.0_f64, 0_u32), |(sum, count), value| {
        (sum + f64::from(value), count + 1)
    });
    if count == 0 {
        return 0.0;
    }
    sum / f64::from(count)
}

fn used_percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    used as f64 / total as f64 * 100.0
}

/// `None` when nvidia-smi is missing, fails or prints something unexpected.
async fn query_gpu() -> Option<f64> {
    let output = match Command::new("nvidia-smi").args(GPU_QUERY).output().await {
        Ok(output) => output,
        Err(err) => {
            trace!(event = "gpu_probe_unavailable", error = %err);
            return None;
        }
    };
    if !output.status.success() {
        return None;
    }
    parse_gpu_utilization(&String::from_utf8_lossy(&output.stdout))
}

pub fn parse_gpu_utilization(stdout: &str) -> Option<f64> {
    let line = stdout.lines().map(str::trim).find(|line| !line.is_empty())?;
    line.parse::<f64>().ok().filter(|value| value.is_finite())
}

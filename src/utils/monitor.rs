#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ResourceStats {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
#[derive(Debug, Default)]
struct Progress {
    peak_memory_mb: u64,
    last_mark: Option<Instant>,
}

/// Samples this process's CPU and memory between pipeline phases and
/// reports how many products each phase handled per second.
#[cfg(feature = "cli")]
pub struct ResourceMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    progress: Mutex<Progress>,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl ResourceMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = if enabled {
            sysinfo::get_current_pid()
                .map_err(|e| tracing::warn!("⚠️ Resource monitoring unavailable: {}", e))
                .ok()
        } else {
            None
        };

        Self {
            system: Mutex::new(System::new()),
            pid,
            started: Instant::now(),
            progress: Mutex::new(Progress::default()),
            enabled,
        }
    }

    pub fn sample(&self) -> Option<ResourceStats> {
        if !self.enabled {
            return None;
        }
        let pid = self.pid?;

        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );
        let process = system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;

        let mut progress = self.progress.lock().ok()?;
        progress.peak_memory_mb = progress.peak_memory_mb.max(memory_mb);

        Some(ResourceStats {
            cpu_usage: process.cpu_usage(),
            memory_mb,
            peak_memory_mb: progress.peak_memory_mb,
            elapsed: self.started.elapsed(),
        })
    }

    /// `items` is the number of products the phase just produced.
    pub fn log_phase(&self, phase: &str, items: usize) {
        let Some(stats) = self.sample() else {
            return;
        };
        let phase_secs = self
            .progress
            .lock()
            .ok()
            .map(|mut p| {
                let now = Instant::now();
                let since = p.last_mark.unwrap_or(self.started);
                p.last_mark = Some(now);
                now.duration_since(since).as_secs_f64()
            })
            .unwrap_or_default();
        let rate = if phase_secs > 0.0 {
            items as f64 / phase_secs
        } else {
            0.0
        };

        tracing::info!(
            "📊 {} - {} products ({:.1}/s), CPU: {:.1}%, Memory: {}MB, Peak: {}MB",
            phase,
            items,
            rate,
            stats.cpu_usage,
            stats.memory_mb,
            stats.peak_memory_mb
        );
    }

    pub fn log_final(&self, analyzed: usize) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Final Stats - {} products in {:?}, Peak Memory: {}MB",
                analyzed,
                stats.elapsed,
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for ResourceMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 建置時的空實作
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct ResourceMonitor;

#[cfg(not(feature = "cli"))]
impl ResourceMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&self, _phase: &str, _items: usize) {}

    pub fn log_final(&self, _analyzed: usize) {}
}

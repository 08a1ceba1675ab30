use tracing::info;

/// Share of a download spent fetching pull request details; the user phase takes the rest.
const PULL_PHASE_WEIGHT: f64 = 0.7;
const TICK: u8 = 10;

/// Tracks download progress across the pull request and user phases and
/// logs every 10% step.
#[derive(Debug)]
pub struct DownloadProgress {
    total: usize,
    pulls_done: usize,
    users_done: usize,
    next_tick: u8,
}

impl DownloadProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            pulls_done: 0,
            users_done: 0,
            next_tick: 0,
        }
    }

    pub fn pull_done(&mut self) {
        self.pulls_done = (self.pulls_done + 1).min(self.total);
        self.report();
    }

    /// One pull request scanned in the user phase.
    pub fn user_done(&mut self) {
        self.users_done = (self.users_done + 1).min(self.total);
        self.report();
    }

    pub fn finish(&mut self) {
        self.pulls_done = self.total;
        self.users_done = self.total;
        self.report();
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let weighted = self.pulls_done as f64 * PULL_PHASE_WEIGHT
            + self.users_done as f64 * (1.0 - PULL_PHASE_WEIGHT);
        ((weighted / self.total as f64) * 100.0).round().min(100.0) as u8
    }

    fn report(&mut self) {
        let percent = self.percent();
        while self.next_tick <= 100 && percent >= self.next_tick {
            info!(progress = self.next_tick, "download progress");
            self.next_tick += TICK;
        }
    }
}

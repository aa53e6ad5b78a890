//! Prometheus metrics (lock-free atomics).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    // --- Page ---
    pub page_views: AtomicU64,
    pub page_config_errors: AtomicU64,

    // --- Mint ---
    pub mint_total: AtomicU64,
    pub mint_success: AtomicU64,
    pub mint_rejected: AtomicU64,
    pub mint_unauthorized: AtomicU64,
    pub mint_reverted: AtomicU64,
    pub mint_insufficient_funds: AtomicU64,
    pub mint_duration_us_sum: AtomicU64,

    // --- Reads ---
    pub read_refreshes: AtomicU64,
    pub read_errors: AtomicU64,
    pub read_evictions: AtomicU64,

    // --- RPC ---
    pub rpc_failovers: AtomicU64,
    pub rpc_errors: AtomicU64,
}

impl Metrics {
    const fn new() -> Self {
        Self {
            page_views: AtomicU64::new(0),
            page_config_errors: AtomicU64::new(0),
            mint_total: AtomicU64::new(0),
            mint_success: AtomicU64::new(0),
            mint_rejected: AtomicU64::new(0),
            mint_unauthorized: AtomicU64::new(0),
            mint_reverted: AtomicU64::new(0),
            mint_insufficient_funds: AtomicU64::new(0),
            mint_duration_us_sum: AtomicU64::new(0),
            read_refreshes: AtomicU64::new(0),
            read_errors: AtomicU64::new(0),
            read_evictions: AtomicU64::new(0),
            rpc_failovers: AtomicU64::new(0),
            rpc_errors: AtomicU64::new(0),
        }
    }

    pub fn record_mint_duration(&self, start: Instant) {
        let us = start.elapsed().as_micros() as u64;
        self.mint_duration_us_sum.fetch_add(us, Ordering::Relaxed);
    }

    /// Render in Prometheus text exposition format.
    pub fn render(&self, tracked_reads: usize) -> String {
        let page_views = self.page_views.load(Ordering::Relaxed);
        let page_config_errors = self.page_config_errors.load(Ordering::Relaxed);
        let mint_total = self.mint_total.load(Ordering::Relaxed);
        let mint_success = self.mint_success.load(Ordering::Relaxed);
        let mint_rejected = self.mint_rejected.load(Ordering::Relaxed);
        let mint_unauthorized = self.mint_unauthorized.load(Ordering::Relaxed);
        let mint_reverted = self.mint_reverted.load(Ordering::Relaxed);
        let mint_insufficient = self.mint_insufficient_funds.load(Ordering::Relaxed);
        let mint_dur_sum_s =
            self.mint_duration_us_sum.load(Ordering::Relaxed) as f64 / 1_000_000.0;
        let read_refreshes = self.read_refreshes.load(Ordering::Relaxed);
        let read_errors = self.read_errors.load(Ordering::Relaxed);
        let read_evictions = self.read_evictions.load(Ordering::Relaxed);
        let rpc_failovers = self.rpc_failovers.load(Ordering::Relaxed);
        let rpc_errors = self.rpc_errors.load(Ordering::Relaxed);

        format!(
            "\
# HELP dropfront_page_views_total Page view requests.\n\
# TYPE dropfront_page_views_total counter\n\
dropfront_page_views_total {page_views}\n\
# HELP dropfront_page_config_errors_total Page requests without a usable contract.\n\
# TYPE dropfront_page_config_errors_total counter\n\
dropfront_page_config_errors_total {page_config_errors}\n\
# HELP dropfront_mint_total Mint requests received.\n\
# TYPE dropfront_mint_total counter\n\
dropfront_mint_total {mint_total}\n\
# HELP dropfront_mint_success_total Mints confirmed or pending.\n\
# TYPE dropfront_mint_success_total counter\n\
dropfront_mint_success_total {mint_success}\n\
# HELP dropfront_mint_rejected_total Mints refused before submission.\n\
# TYPE dropfront_mint_rejected_total counter\n\
dropfront_mint_rejected_total {mint_rejected}\n\
# HELP dropfront_mint_unauthorized_total Mint requests without a valid API key.\n\
# TYPE dropfront_mint_unauthorized_total counter\n\
dropfront_mint_unauthorized_total {mint_unauthorized}\n\
# HELP dropfront_mint_reverted_total Mints that reverted or failed to submit.\n\
# TYPE dropfront_mint_reverted_total counter\n\
dropfront_mint_reverted_total {mint_reverted}\n\
# HELP dropfront_mint_insufficient_funds_total Reverts classified as insufficient value.\n\
# TYPE dropfront_mint_insufficient_funds_total counter\n\
dropfront_mint_insufficient_funds_total {mint_insufficient}\n\
# HELP dropfront_mint_duration_seconds_sum Total mint handler time (seconds).\n\
# TYPE dropfront_mint_duration_seconds_sum counter\n\
dropfront_mint_duration_seconds_sum {mint_dur_sum_s:.6}\n\
# HELP dropfront_read_refreshes_total Upstream read fetches.\n\
# TYPE dropfront_read_refreshes_total counter\n\
dropfront_read_refreshes_total {read_refreshes}\n\
# HELP dropfront_read_errors_total Failed upstream read fetches.\n\
# TYPE dropfront_read_errors_total counter\n\
dropfront_read_errors_total {read_errors}\n\
# HELP dropfront_read_evictions_total Reads dropped for idleness or capacity.\n\
# TYPE dropfront_read_evictions_total counter\n\
dropfront_read_evictions_total {read_evictions}\n\
# HELP dropfront_reads_tracked Reads currently polled.\n\
# TYPE dropfront_reads_tracked gauge\n\
dropfront_reads_tracked {tracked_reads}\n\
# HELP dropfront_rpc_failovers_total RPC primary-to-fallback failovers.\n\
# TYPE dropfront_rpc_failovers_total counter\n\
dropfront_rpc_failovers_total {rpc_failovers}\n\
# HELP dropfront_rpc_errors_total RPC errors.\n\
# TYPE dropfront_rpc_errors_total counter\n\
dropfront_rpc_errors_total {rpc_errors}\n"
        )
    }
}

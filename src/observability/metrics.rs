//! Store metrics.
//!
//! # Metrics
//! - `config_reloads_total` (counter): reloads by `outcome` (success, failure)
//! - `config_saves_total` (counter): saves by `outcome`
//! - `config_poll_ticks_total` (counter): scheduler ticks
//! - `config_top_level_keys` (gauge): top-level entries after the last change

pub fn record_reload(success: bool) {
    metrics::counter!("config_reloads_total", "outcome" => outcome(success)).increment(1);
}

pub fn record_save(success: bool) {
    metrics::counter!("config_saves_total", "outcome" => outcome(success)).increment(1);
}

pub fn record_poll_tick() {
    metrics::counter!("config_poll_ticks_total").increment(1);
}

pub fn record_tree_size(keys: usize) {
    metrics::gauge!("config_top_level_keys").set(keys as f64);
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

use crate::store::Store;

pub async fn run(store: &Store) {
    tracing::debug!("log_flush: start");
    match store.flush() {
        Ok(()) => tracing::debug!(records = store.count_events(), "log_flush: done"),
        Err(e) => tracing::error!(error = %e, "log_flush failed"),
    }
}

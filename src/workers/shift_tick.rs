use crate::engine::shift::ShiftTick;
use crate::state::SessionHandle;

pub async fn run(handle: &SessionHandle) {
    let now = chrono::Utc::now().timestamp_millis();
    match handle.tick_shift(now).tick {
        ShiftTick::Expired { pending } => {
            tracing::info!(pending_tracking_id = ?pending, "shift_tick: rotation required")
        }
        ShiftTick::Remaining { remaining_ms } => {
            tracing::trace!(remaining_ms, "shift_tick: counting")
        }
        ShiftTick::Inactive => {}
    }
}

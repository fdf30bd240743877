use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum StatsTransition {
    LookAwayStarted,
    LookAwayEnded { duration_ms: i64 },
}

/// 按需计算的会话统计快照，包含尚未结束的当前区间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub looking_ms: i64,
    pub away_ms: i64,
    pub focus_percent: i64,
    pub look_away_count: u32,
    pub longest_focus_ms: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    total_looking_ms: i64,
    total_away_ms: i64,
    look_away_count: u32,
    longest_focus_ms: i64,
    current_state: Option<bool>,
    current_state_since: i64,
    focus_started_at: i64,
    session_started_at: Option<i64>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_state(&self) -> Option<bool> {
        self.current_state
    }

    pub fn session_started_at(&self) -> Option<i64> {
        self.session_started_at
    }

    pub fn update(&mut self, now: i64, looking: bool) -> Option<StatsTransition> {
        let Some(previous) = self.current_state else {
            self.seed(now, looking);
            return None;
        };

        if previous == looking {
            return None;
        }

        let delta = now - self.current_state_since;
        let transition = if previous {
            self.total_looking_ms += delta;
            self.longest_focus_ms = self.longest_focus_ms.max(now - self.focus_started_at);
            self.look_away_count += 1;
            StatsTransition::LookAwayStarted
        } else {
            self.total_away_ms += delta;
            self.focus_started_at = now;
            StatsTransition::LookAwayEnded { duration_ms: delta }
        };

        self.current_state_since = now;
        self.current_state = Some(looking);
        Some(transition)
    }

    /// Sets the starting state without producing counters.
    pub fn seed(&mut self, now: i64, looking: bool) {
        self.current_state = Some(looking);
        self.current_state_since = now;
        if looking {
            self.focus_started_at = now;
        }
        self.session_started_at.get_or_insert(now);
    }

    pub fn summary(&self, now: i64) -> StatsSummary {
        let open = match self.current_state {
            Some(_) => (now - self.current_state_since).max(0),
            None => 0,
        };
        let looking_ms = self.total_looking_ms + if self.current_state == Some(true) { open } else { 0 };
        let away_ms = self.total_away_ms + if self.current_state == Some(false) { open } else { 0 };
        let focus_percent = (looking_ms * 100) / (looking_ms + away_ms).max(1);

        StatsSummary {
            looking_ms,
            away_ms,
            focus_percent,
            look_away_count: self.look_away_count,
            longest_focus_ms: self.longest_focus_ms,
        }
    }

    /// Forgets the running interval but keeps the totals; the next update reseeds.
    pub fn detach_clock(&mut self) {
        self.current_state = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

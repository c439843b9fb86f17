//! Автоматический выход после долгой неактивности.

use std::time::Duration;

/// Лимит неактивности по умолчанию: 10 часов.
pub const DEFAULT_INACTIVITY_LIMIT: Duration = Duration::from_secs(10 * 60 * 60);

/// Часы неактивности без собственного таймера.
///
/// Время передаётся снаружи в миллисекундах от произвольной точки отсчёта
/// (tokio `Instant`, `performance.now()` в браузере), поэтому одни и те же
/// часы работают и в CLI, и в wasm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InactivityClock {
    limit_ms: u64,
    last_activity_ms: u64,
}

impl InactivityClock {
    /// Заводит часы в момент `now_ms`.
    pub fn new(limit: Duration, now_ms: u64) -> Self {
        Self {
            limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            last_activity_ms: now_ms,
        }
    }

    /// Фиксирует активность пользователя и переносит срок.
    pub fn record_activity(&mut self, now_ms: u64) {
        self.last_activity_ms = self.last_activity_ms.max(now_ms);
    }

    /// Момент, после которого сессия считается брошенной.
    pub fn deadline_ms(&self) -> u64 {
        self.last_activity_ms.saturating_add(self.limit_ms)
    }

    /// Истёк ли срок к моменту `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.deadline_ms()
    }

    /// Сколько осталось до выхода.
    pub fn remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.deadline_ms().saturating_sub(now_ms))
    }

    /// Настроенный лимит.
    pub fn limit(&self) -> Duration {
        Duration::from_millis(self.limit_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_postpones_expiry() {
        let mut clock = InactivityClock::new(Duration::from_secs(10), 0);
        assert!(!clock.is_expired(9_999));

        clock.record_activity(5_000);
        assert!(!clock.is_expired(14_999));
        assert!(clock.is_expired(15_000));
        assert_eq!(clock.remaining(10_000), Duration::from_secs(5));
    }

    #[test]
    fn stale_activity_does_not_move_clock_back() {
        let mut clock = InactivityClock::new(Duration::from_secs(10), 5_000);
        clock.record_activity(1_000);
        assert_eq!(clock.deadline_ms(), 15_000);
    }

    #[test]
    fn default_limit_is_ten_hours() {
        let clock = InactivityClock::new(DEFAULT_INACTIVITY_LIMIT, 0);
        assert_eq!(clock.limit(), Duration::from_secs(36_000));
        assert_eq!(clock.remaining(40_000_000), Duration::ZERO);
    }
}

//! Transient notices and in-flight controls.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a notice stays visible.
pub const NOTICE_LIFETIME: Duration = Duration::from_millis(2500);

/// A short status message shown to the user, e.g. `Feedback saved`.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub message: String,
    pub ok: bool,
    pub raised_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, ok: bool) -> Self {
        Self {
            message: message.into(),
            ok,
            raised_at: Instant::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, true)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, false)
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= NOTICE_LIFETIME
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// A trigger that is disabled while its request runs.
#[derive(Debug, Clone)]
pub struct Control {
    name: &'static str,
    busy: Arc<AtomicBool>,
}

impl Control {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_disabled(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Disable the control, or `None` if it is already disabled.
    pub fn try_acquire(&self) -> Option<ControlGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ControlGuard {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Re-enables its control when dropped.
#[derive(Debug)]
pub struct ControlGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

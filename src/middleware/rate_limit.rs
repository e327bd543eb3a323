use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::actor::Actor;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

#[derive(Debug)]
struct Windows {
    by_actor: HashMap<Option<Uuid>, WindowState>,
    last_sweep: Instant,
}

/// Fixed one-second window per authenticated actor. Requests without an
/// actor share one anonymous window. Expired windows are dropped at most once
/// per window length.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    windows: Arc<Mutex<Windows>>,
}

impl RateLimiter {
    fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            windows: Arc::new(Mutex::new(Windows {
                by_actor: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    fn allow(&self, key: Option<Uuid>) -> bool {
        self.allow_at(key, Instant::now())
    }

    fn allow_at(&self, key: Option<Uuid>, now: Instant) -> bool {
        let mut windows = self.windows.lock();
        if now.saturating_duration_since(windows.last_sweep) >= WINDOW {
            windows
                .by_actor
                .retain(|_, w| now.saturating_duration_since(w.start) < WINDOW);
            windows.last_sweep = now;
        }

        let window = windows.by_actor.entry(key).or_insert(WindowState {
            start: now,
            count: 0,
        });
        if now.saturating_duration_since(window.start) >= WINDOW {
            window.start = now;
            window.count = 0;
        }
        if window.count < self.rps {
            window.count += 1;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.windows.lock().by_actor.len()
    }
}

pub async fn rps_middleware(
    State(state): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = req.extensions().get::<Actor>().map(|a| a.id);
    if !state.allow(key) {
        tracing::warn!(actor = ?key, "rate limit exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "rate_limit_exceeded").into_response();
    }
    next.run(req).await
}

pub fn new_rps_state(rps: u32) -> RateLimiter {
    RateLimiter::new(rps)
}

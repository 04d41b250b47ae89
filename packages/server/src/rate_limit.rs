use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Stale windows are swept once the table grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by client IP.
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    windows: DashMap<IpAddr, Window>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            window: Duration::from_secs(config.window_secs.max(1)),
            max_requests: config.max_requests,
            windows: DashMap::new(),
        }
    }

    /// Count one request from `client`. On rejection returns the seconds until
    /// the current window closes.
    pub fn check(&self, client: IpAddr, now: Instant) -> Result<(), u64> {
        if self.windows.len() > SWEEP_THRESHOLD {
            self.windows
                .retain(|_, w| now.duration_since(w.started) < self.window);
        }

        let mut entry = self.windows.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        let window = entry.value_mut();

        let elapsed = now.duration_since(window.started);
        if elapsed >= self.window {
            *window = Window {
                started: now,
                count: 0,
            };
        }

        if window.count >= self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(window.started));
            return Err(remaining.as_secs().max(1));
        }
        window.count += 1;
        Ok(())
    }
}

/// Middleware rejecting clients that exceed the configured request rate.
///
/// Requests without a peer address (e.g. in-process test clients) are not limited.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        state
            .rate_limiter
            .check(addr.ip(), Instant::now())
            .map_err(|retry_after| {
                tracing::debug!(client = %addr.ip(), retry_after, "Rate limit exceeded");
                AppError::RateLimited { retry_after }
            })?;
    }
    Ok(next.run(request).await)
}

use std::time::Duration;

use gloo_timers::future::TimeoutFuture;

use gitlab_panel::controller::Timer;

pub struct GlooTimer;

impl Timer for GlooTimer {
    async fn sleep(&self, duration: Duration) {
        let millis = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        TimeoutFuture::new(millis).await;
    }
}

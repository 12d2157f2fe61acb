use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Per-request timeout handed to the [`HttpClient`](super::HttpClient).
    pub request_timeout: Duration,
    /// Upper bound for a whole `run`, dependencies and delegations included.
    pub workflow_deadline: Option<Duration>,
    /// Port used for server urls naming `localhost` without one.
    pub localhost_fallback_port: u16,
    pub default_content_type: String,
    pub max_response_bytes: usize,
    /// Cap on any single retry wait, whether from `retryAfter` or `Retry-After`.
    pub max_retry_delay: Duration,
    /// Step executions allowed per run; bounds goto loops.
    pub max_step_executions: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            workflow_deadline: None,
            localhost_fallback_port: 8080,
            default_content_type: "application/json".to_string(),
            max_response_bytes: 10 * 1024 * 1024,
            max_retry_delay: Duration::from_secs(60),
            max_step_executions: 1000,
        }
    }
}

//! Inbound classification, session invalidation and user notification.

use std::sync::Arc;

use spadesk_api::{ApiResponse, Notifier, Severity, SpaError, TransportError};
pub use spadesk_api::{DEFAULT_FAILURE_MESSAGE, extract_message};

use crate::SessionManager;

/// Turn a raw transport failure into the error taxonomy.
pub fn classify(err: TransportError) -> SpaError {
    match err {
        TransportError::NoResponse { message } => SpaError::Network { message },
        TransportError::Status(ApiResponse { status: 401, body }) => {
            SpaError::Unauthorized { body }
        }
        TransportError::Status(ApiResponse { status, body }) => SpaError::Http { status, body },
    }
}

/// Human-readable text for a classified failure.
pub fn failure_message(err: &SpaError) -> String {
    err.user_message()
}

/// Side effect run on every classified failure. Stages observe; they never
/// replace or swallow the error.
pub trait ResponseStage: Send + Sync {
    fn name(&self) -> &'static str;
    fn on_failure(&self, error: &SpaError);

    /// Stages that talk to the user are skipped by
    /// [`ResponsePipeline::observe_quietly`].
    fn notifies_user(&self) -> bool {
        false
    }
}

/// Drops the session when the server answers 401. Does not navigate.
pub struct InvalidateOnUnauthorized {
    session: Arc<SessionManager>,
}

impl InvalidateOnUnauthorized {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }
}

impl ResponseStage for InvalidateOnUnauthorized {
    fn name(&self) -> &'static str {
        "invalidate-on-401"
    }

    fn on_failure(&self, error: &SpaError) {
        if matches!(error, SpaError::Unauthorized { .. }) && !self.session.invalidate() {
            tracing::debug!("unauthorized response with no session to clear");
        }
    }
}

/// Emits exactly one error notification per failed call.
pub struct NotifyOnFailure {
    notifier: Arc<dyn Notifier>,
}

impl NotifyOnFailure {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

impl ResponseStage for NotifyOnFailure {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn on_failure(&self, error: &SpaError) {
        self.notifier.notify(&failure_message(error), Severity::Error);
    }

    fn notifies_user(&self) -> bool {
        true
    }
}

#[derive(Default)]
pub struct ResponsePipeline {
    stages: Vec<Box<dyn ResponseStage>>,
}

impl ResponsePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate first, then notify.
    pub fn standard(session: Arc<SessionManager>, notifier: Arc<dyn Notifier>) -> Self {
        Self::new()
            .with_stage(InvalidateOnUnauthorized::new(session))
            .with_stage(NotifyOnFailure::new(notifier))
    }

    #[must_use]
    pub fn with_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Pass successes through untouched; classify failures, run every stage,
    /// then hand the error back to the caller.
    pub fn observe(
        &self,
        outcome: Result<ApiResponse, TransportError>,
    ) -> Result<ApiResponse, SpaError> {
        self.run(outcome, true)
    }

    /// Like [`observe`](Self::observe) but without user notification. The
    /// caller owns reporting the failure, exactly once.
    pub fn observe_quietly(
        &self,
        outcome: Result<ApiResponse, TransportError>,
    ) -> Result<ApiResponse, SpaError> {
        self.run(outcome, false)
    }

    fn run(
        &self,
        outcome: Result<ApiResponse, TransportError>,
        notify: bool,
    ) -> Result<ApiResponse, SpaError> {
        let err = match outcome {
            Ok(response) => return Ok(response),
            Err(err) => classify(err),
        };

        tracing::debug!(error = %err, "request failed");
        for stage in self.stages.iter().filter(|s| notify || !s.notifies_user()) {
            stage.on_failure(&err);
        }
        Err(err)
    }
}

//! Request pipeline.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → security::SecurityGate      (terminates: 403 / 405 / 429 / preflight 200)
//!     → auth::AuthGate              (verdict: Authenticated | Rejected)
//!     → routing::DualModeRouter     (one table per verdict, first match wins)
//!     → dispatch::HandlerRegistry   (typed handler call)
//!     → response::ResponseFormatter (capped envelope, devmode section)
//!     → PipelineResponse
//! ```
//!
//! # Design Decisions
//! - Fully synchronous; the HTTP layer runs it on the blocking pool
//! - Gates and formatter sit behind `ArcSwap` so config reloads never block
//!   in-flight requests; route tables and the registry are frozen at bootstrap
//! - A terminating gate discards the request's feedback
//! - The body is decoded only once the gates have passed, and a bad body is
//!   reported only for a request that routes
//! - Every outcome except the preflight carries a JSON body

pub mod request;

pub use request::{parse_query, InboundRequest, RawBody, X_SESSION_ID};

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use arc_swap::ArcSwap;
use axum::http::{HeaderMap, StatusCode};
use serde_json::{json, Value};

use crate::auth::{AuthGate, AuthSettings, AuthVerdict, CredentialStore};
use crate::config::{FeedbackConfig, GatewayConfig, RunMode};
use crate::dispatch::{Collaborators, HandlerRegistry, RegistryError, RequestContext};
use crate::error::GatewayError;
use crate::feedback::{FeedbackBus, FeedbackEntry, Severity, TestFeedbackStore};
use crate::observability::metrics;
use crate::response::{Envelope, Formatted, ResponseFormatter};
use crate::routing::{DualModeRouter, RouteInfo, TableKind};
use crate::security::{GateDecision, RateLimiter, SecurityGate, SessionStore};

/// What the HTTP layer writes back.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` only for the preflight short-circuit.
    pub body: Option<Value>,
}

/// The reloadable part of the pipeline.
#[derive(Debug)]
struct Stages {
    mode: RunMode,
    security: SecurityGate,
    auth: AuthGate,
    formatter: ResponseFormatter,
    feedback: FeedbackConfig,
}

impl Stages {
    fn build(config: &GatewayConfig, limiter: &RateLimiter) -> Self {
        Self {
            mode: config.mode,
            security: SecurityGate::new(config, limiter),
            auth: AuthGate::new(AuthSettings::from_config(config)),
            formatter: ResponseFormatter::new(config.mode, &config.response),
            feedback: config.feedback.clone(),
        }
    }
}

pub struct Pipeline {
    stages: ArcSwap<Stages>,
    limiter: RateLimiter,
    credentials: Arc<dyn CredentialStore>,
    router: Arc<DualModeRouter>,
    registry: Arc<HandlerRegistry>,
    collaborators: Arc<Collaborators>,
    test_feedback: Arc<TestFeedbackStore>,
}

impl Pipeline {
    /// Assemble the pipeline. Fails if any routed handler id is unregistered.
    pub fn new(
        config: &GatewayConfig,
        router: DualModeRouter,
        registry: HandlerRegistry,
        collaborators: Collaborators,
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Result<Self, RegistryError> {
        registry.verify(&router)?;

        let limiter = RateLimiter::new(
            sessions,
            config.rate_limit.limit,
            std::time::Duration::from_secs(config.rate_limit.period_secs),
        );
        let stages = Stages::build(config, &limiter);

        tracing::info!(
            mode = ?config.mode,
            restricted = config.environment.restricted,
            rate_limited = stages.security.rate_limited(),
            handlers = registry.len(),
            "Pipeline assembled"
        );

        Ok(Self {
            stages: ArcSwap::from_pointee(stages),
            limiter,
            credentials,
            router: Arc::new(router),
            registry: Arc::new(registry),
            collaborators: Arc::new(collaborators),
            test_feedback: Arc::new(TestFeedbackStore::new()),
        })
    }

    /// Rebuild gates and formatter from a reloaded config. Rate state survives.
    pub fn reload(&self, config: &GatewayConfig) {
        self.stages.store(Arc::new(Stages::build(config, &self.limiter)));
        tracing::info!(mode = ?config.mode, "Pipeline stages reloaded");
    }

    pub fn mode(&self) -> RunMode {
        self.stages.load().mode
    }

    pub fn router(&self) -> &DualModeRouter {
        &self.router
    }

    /// Entries recorded by requests tagged with `test_id`.
    pub fn feedback_for_test(&self, test_id: &str, severity: Option<Severity>) -> Vec<FeedbackEntry> {
        self.test_feedback.entries(test_id, severity)
    }

    pub fn clear_test_feedback(&self, test_id: &str) {
        self.test_feedback.clear(test_id);
    }

    /// Run one request through every stage.
    pub fn handle(&self, request: InboundRequest, now: SystemTime) -> PipelineResponse {
        let start = Instant::now();
        let stages = self.stages.load();
        let method = request.method.to_string();

        let response = self.run(&stages, request, now);
        metrics::record_request(&method, response.status.as_u16(), start);
        response
    }

    fn run(&self, stages: &Stages, request: InboundRequest, now: SystemTime) -> PipelineResponse {
        let feedback = self.feedback_bus(stages, &request);

        let headers = match stages.security.check(&request, now) {
            GateDecision::Proceed { headers } => headers,
            GateDecision::Preflight { headers } => {
                feedback.discard();
                return PipelineResponse {
                    status: StatusCode::OK,
                    headers,
                    body: None,
                };
            }
            GateDecision::Reject { headers, error } => {
                feedback.discard();
                return reject(headers, &request.request_id, &error);
            }
        };

        let token = stages.auth.extract_token(&request.headers, &request.query);
        let verdict = stages.auth.authenticate(token.as_deref(), self.credentials.as_ref());

        let (body, body_error) = match request.body.decode() {
            Ok(body) => (body, None),
            Err(error) => (None, Some(error)),
        };

        let ctx = RequestContext::new(
            request.request_id,
            request.method,
            request.path,
            verdict.identity().cloned(),
            feedback,
        )
        .with_query(request.query)
        .with_body(body)
        .with_mode(stages.mode);

        let outcome = match body_error {
            None => self
                .router
                .dispatch(&ctx, &verdict, &self.registry, &self.collaborators),
            Some(error) => self
                .router
                .resolve(&verdict, &ctx.method, &ctx.path)
                .and(Err(error)),
        };

        let formatted = match outcome {
            Ok(response) => {
                let envelope = Envelope::success(response.payload, response.message);
                stages.formatter.format_default(&envelope, response.status)
            }
            Err(error @ GatewayError::Unauthorized(_)) => {
                // The authentication gate terminates here; nothing was surfaced yet.
                ctx.feedback().discard();
                return reject(headers, &ctx.request_id, &error);
            }
            Err(error) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    status = error.status().as_u16(),
                    reason = error.reason(),
                    error = %error,
                    "Request failed"
                );
                stages.formatter.format_error(&error)
            }
        };

        let formatted = self.finish(formatted, &ctx, &verdict);
        PipelineResponse {
            status: formatted.status,
            headers,
            body: Some(formatted.body),
        }
    }

    fn feedback_bus(&self, stages: &Stages, request: &InboundRequest) -> FeedbackBus {
        if !stages.feedback.test_mode {
            return FeedbackBus::new();
        }
        match request.header(stages.feedback.test_header.as_str()) {
            Some(test_id) if !test_id.is_empty() => {
                FeedbackBus::for_test(Arc::clone(&self.test_feedback), test_id)
            }
            _ => FeedbackBus::new(),
        }
    }

    /// Append the devmode section when the formatter left the body open.
    fn finish(&self, mut formatted: Formatted, ctx: &RequestContext, verdict: &AuthVerdict) -> Formatted {
        if !formatted.terminal {
            let section = self.devmode_section(ctx, verdict);
            formatted.append("devmode", section);
        }
        formatted.finish()
    }

    fn devmode_section(&self, ctx: &RequestContext, verdict: &AuthVerdict) -> Value {
        let feedback: serde_json::Map<String, Value> = ctx
            .feedback()
            .snapshot()
            .into_iter()
            .map(|(severity, entries)| {
                let key = serde_json::to_value(severity)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                let texts = entries.into_iter().map(|e| Value::String(e.text)).collect();
                (key, Value::Array(texts))
            })
            .collect();

        let routes = |kind| -> Vec<RouteInfo> {
            self.router.routes(kind).iter().map(RouteInfo::from).collect()
        };

        json!({
            "request_id": ctx.request_id,
            "table": TableKind::for_verdict(verdict),
            "identity": verdict.identity(),
            "auth_message": verdict.message(),
            "feedback": feedback,
            "routes": {
                "authenticated": routes(TableKind::Authenticated),
                "anonymous": routes(TableKind::Anonymous),
            },
        })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("mode", &self.mode())
            .field("router", &self.router)
            .field("registry", &self.registry)
            .finish()
    }
}

fn reject(headers: HeaderMap, request_id: &str, error: &GatewayError) -> PipelineResponse {
    tracing::info!(
        request_id = %request_id,
        status = error.status().as_u16(),
        reason = error.reason(),
        "Request terminated by gate"
    );
    metrics::record_gate_rejection(error.reason());

    // Never a diagnostic view: clients must see the real status.
    let body = Envelope::error(error.to_string()).to_value();
    PipelineResponse {
        status: error.status(),
        headers,
        body: Some(body),
    }
}

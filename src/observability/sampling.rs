//! Trace sampling policy.
//!
//! The policy is consulted once per trace root and answers record-or-drop.
//! Always-on is the default; the other variants exist so operators can cut
//! volume without touching code.

use opentelemetry::trace::{SamplingDecision, SpanKind, TraceId};
use opentelemetry::Context;
use opentelemetry_sdk::trace::{Sampler, ShouldSample};

use crate::config::{SamplerKind, SamplingConfig};

/// Decides whether a new trace is recorded.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SamplingPolicy {
    #[default]
    AlwaysOn,
    AlwaysOff,
    /// Keep a deterministic fraction of trace ids.
    TraceIdRatio(f64),
    /// Inherit the parent's decision; use the inner policy for roots.
    ParentBased(Box<SamplingPolicy>),
}

impl SamplingPolicy {
    pub fn from_config(config: &SamplingConfig) -> Self {
        let root = match config.policy {
            SamplerKind::AlwaysOn => SamplingPolicy::AlwaysOn,
            SamplerKind::AlwaysOff => SamplingPolicy::AlwaysOff,
            SamplerKind::Ratio if config.ratio >= 1.0 => SamplingPolicy::AlwaysOn,
            SamplerKind::Ratio if config.ratio <= 0.0 => SamplingPolicy::AlwaysOff,
            SamplerKind::Ratio => SamplingPolicy::TraceIdRatio(config.ratio),
        };

        if config.parent_based {
            SamplingPolicy::ParentBased(Box::new(root))
        } else {
            root
        }
    }

    /// SDK sampler implementing this policy.
    pub fn to_sampler(&self) -> Sampler {
        match self {
            SamplingPolicy::AlwaysOn => Sampler::AlwaysOn,
            SamplingPolicy::AlwaysOff => Sampler::AlwaysOff,
            SamplingPolicy::TraceIdRatio(ratio) => Sampler::TraceIdRatioBased(*ratio),
            SamplingPolicy::ParentBased(root) => Sampler::ParentBased(Box::new(root.to_sampler())),
        }
    }

    /// Record-or-drop decision for a trace root (or a child when a parent
    /// context is supplied).
    pub fn decide(&self, parent: Option<&Context>, trace_id: TraceId) -> SamplingDecision {
        self.to_sampler()
            .should_sample(parent, trace_id, "request", &SpanKind::Server, &[], &[])
            .decision
    }
}

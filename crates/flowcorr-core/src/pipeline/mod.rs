pub mod config;
mod helpers;
mod orchestrator;
pub mod snapshot;
mod types;

pub use config::{AnalysisConfig, ChannelSelect, EmptyChannelPolicy, FlowConfig};
pub use helpers::{verdict_for_fraction, verdict_from_lengths};
pub use orchestrator::{
    analyze_channel, analyze_channel_reported, analyze_stack, analyze_stack_reported,
};
pub use snapshot::{flow_snapshots, representative_pairs, stack_snapshots, FlowSnapshot};
pub use types::{
    AnalysisStage, ChannelAnalysis, FlowSummary, PairMetrics, ProgressReporter, Verdict,
};

//! Integration tests for Undertow
//!
//! These tests verify the integration between different components of the
//! system: the metadata pipeline from raw torrent bytes to stored record and
//! reconstructed download, and the HTTP API surface served in-process.

#[path = "integration/pipeline.rs"]
mod pipeline;

#[path = "integration/api_workflow.rs"]
mod api_workflow;

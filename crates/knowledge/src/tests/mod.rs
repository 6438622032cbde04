//! Scenario tests for the answering pipeline.

mod pipeline;

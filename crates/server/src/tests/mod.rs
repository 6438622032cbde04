//! HTTP API tests against in-memory pipeline stages.

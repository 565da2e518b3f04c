//! Unit tests for the directory context.

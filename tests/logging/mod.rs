//! Debug logger tests

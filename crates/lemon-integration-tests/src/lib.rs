//! Integration test crate for the Little Lemon store.
//!
//! No library code lives here. The tests open real database files in a
//! temporary directory and drive the menu cache and session store across
//! simulated app restarts.
//!
//! ```sh
//! cargo test -p lemon-integration-tests
//! ```

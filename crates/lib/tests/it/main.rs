/*! Integration tests for Amalgam.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - history: Changes, hashing and the change log
 * - document: Editing and reading documents through the public API
 * - merge: Merging and applying changes between replicas
 * - observer: Change notifications and callback isolation
 * - codec: Save/load and the chunk format
 * - properties: Convergence properties over randomized replay orders
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("amalgam=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod codec;
mod document;
mod helpers;
mod history;
mod merge;
mod observer;
mod properties;

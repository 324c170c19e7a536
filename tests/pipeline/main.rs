//! End-to-end pipeline tests using Cucumber.
//!
//! Seed, expire, deliver and archive against the in-memory stores:
//!
//! ```bash
//! cargo test --test pipeline --features test-utils
//! ```

mod steps;

use cucumber::World;
use steps::archival::ArchivalWorld;
use steps::seeding::SeedingWorld;

#[tokio::main]
async fn main() {
    println!("\n=== Running Seeding Tests ===\n");
    SeedingWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/pipeline/features/seeding.feature")
        .await;

    println!("\n=== Running Archival Tests ===\n");
    ArchivalWorld::cucumber()
        .fail_on_skipped()
        .run_and_exit("tests/pipeline/features/archival.feature")
        .await;
}

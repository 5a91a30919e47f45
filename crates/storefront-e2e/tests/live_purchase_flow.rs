//! Scenarios against the live storefront in headless Chromium.
//!
//! Needs a Chromium binary and network access:
//!
//! ```text
//! CHROMIUM_PATH=/usr/bin/chromium cargo test --features browser -- --ignored
//! ```

#![cfg(feature = "browser")]

use storefront_e2e::prelude::*;

async fn run_live(meta: TestMeta) -> StoreResult<Storefront> {
    let config = SuiteConfig::from_env()?;
    Storefront::launch(&config, meta).await
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_complete_purchase_flow() {
    let store = run_live(scenarios::COMPLETE_PURCHASE_FLOW).await.unwrap();
    store
        .run(scenarios::complete_purchase_flow(&store))
        .await
        .unwrap();
    assert_eq!(store.report().status(), TestStatus::Passed);
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_user_registration() {
    let store = run_live(scenarios::USER_REGISTRATION).await.unwrap();
    store.run(scenarios::user_registration(&store)).await.unwrap();
}

#[tokio::test]
#[ignore = "requires chromium and network access"]
async fn test_add_products_to_cart() {
    let store = run_live(scenarios::ADD_PRODUCTS_TO_CART).await.unwrap();
    store.run(scenarios::add_products_to_cart(&store)).await.unwrap();
}

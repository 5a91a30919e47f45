//! Scenario scripts.
//!
//! Straight-line journeys over the page objects of a [`Storefront`]. Each
//! top-level step is a report step; checks go through the `expect_*`
//! helpers so a mismatch fails the test instead of breaking it.

use crate::assertion::{expect_contains, expect_that};
use crate::fixture::Storefront;
use crate::pages::CartLineItem;
use crate::page_object::PageObject;
use crate::report::{Severity, TestMeta};
use crate::result::StoreResult;

/// Registration, two products, cart check and a paid order
pub const COMPLETE_PURCHASE_FLOW: TestMeta = TestMeta::new("complete_purchase_flow")
    .description(
        "Complete end-to-end flow: register a new user, add 2 products to the cart, \
         verify the cart, then check out and pay",
    )
    .epic("E-Commerce")
    .feature("Complete Purchase Flow")
    .story("User Registration and Purchase")
    .severity(Severity::Critical)
    .markers(&["smoke", "regression"]);

/// Registration alone
pub const USER_REGISTRATION: TestMeta = TestMeta::new("user_registration")
    .description("Register a new user with valid data")
    .epic("E-Commerce")
    .feature("User Registration")
    .story("New User Signup")
    .severity(Severity::Critical)
    .markers(&["smoke"]);

/// Two products into the cart
pub const ADD_PRODUCTS_TO_CART: TestMeta = TestMeta::new("add_products_to_cart")
    .description("Add 2 products to the cart and verify the count")
    .epic("E-Commerce")
    .feature("Shopping Cart")
    .story("Add Products to Cart")
    .severity(Severity::Normal)
    .markers(&["cart"]);

/// Every scenario with its metadata
pub const ALL: [TestMeta; 3] = [COMPLETE_PURCHASE_FLOW, USER_REGISTRATION, ADD_PRODUCTS_TO_CART];

/// Products the cart scenarios add, by 1-based position
pub const PRODUCT_INDICES: [usize; 2] = [1, 2];

pub async fn complete_purchase_flow(store: &Storefront) -> StoreResult<()> {
    let report = store.report();
    let user = &store.user;
    let payment = &store.payment;

    report
        .run_step("Step 1: Open home page", async {
            store.home.open().await?;
            store.home.base().screenshot("home_page").await?;
            let title = store.home.base().title().await?;
            expect_contains(&title, "Automation Exercise")
        })
        .await?;

    report
        .run_step("Step 2: Navigate to Signup/Login page", async {
            store.home.click_signup_login().await?;
            store.signup_login.base().screenshot("signup_page").await
        })
        .await?;

    report
        .run_step("Step 3: Register new user", async {
            report.attach_text(
                "User Registration Data",
                format!("Name: {}\nEmail: {}", user.name, user.email),
            );
            store.signup_login.complete_registration(user).await?;
            expect_that(
                store.home.is_user_logged_in(&user.name).await?,
                "User is not logged in after registration",
            )?;
            store.home.base().screenshot("user_logged_in").await
        })
        .await?;

    report
        .run_step("Step 4: Navigate to Products page", async {
            store.home.click_products().await?;
            expect_that(
                store.products.is_products_page_loaded().await?,
                "Products page is not loaded",
            )?;
            store.products.base().screenshot("products_page").await
        })
        .await?;

    report
        .run_step("Step 5: Add 2 products to cart", async {
            report.attach_text(
                "Products to Add",
                format!("Adding products at indices: {PRODUCT_INDICES:?}"),
            );
            store.products.add_product_to_cart(PRODUCT_INDICES[0]).await?;
            store.products.click_continue_shopping().await?;
            store.products.add_product_to_cart(PRODUCT_INDICES[1]).await?;
            store.products.click_view_cart_modal().await
        })
        .await?;

    report
        .run_step("Step 6: Verify products in cart", async {
            expect_that(
                store.cart.verify_cart_items_count(PRODUCT_INDICES.len()).await?,
                "Cart does not contain 2 products",
            )?;

            let items = store.cart.get_all_products_info().await?;
            report.attach_text("Cart Details", cart_details(&items));

            store.cart.capture_cart_state().await?;
            expect_that(store.cart.is_cart_not_empty().await?, "Cart is empty")
        })
        .await?;

    report
        .run_step("Step 7: Proceed to checkout", async {
            store.cart.click_proceed_to_checkout().await?;
            store.checkout.base().screenshot("checkout_page").await
        })
        .await?;

    let confirmation = report
        .run_step("Step 8: Complete purchase", async {
            let comment = store.comment();
            report.attach_text(
                "Payment and Order Details",
                format!(
                    "Card: {}\nName: {}\nExpiry: {}/{}\nComment: {comment}",
                    payment.card_number,
                    payment.name_on_card,
                    payment.expiry_month,
                    payment.expiry_year
                ),
            );

            store.checkout.complete_checkout(payment, comment).await?;
            expect_that(
                store.checkout.is_order_placed().await,
                "Order was not placed successfully",
            )?;

            let message = store.checkout.get_confirmation_message().await?;
            report.attach_text("Order Confirmation Message", message.clone());
            Ok(message)
        })
        .await?;

    report
        .run_step("Step 9: Final verification", async {
            expect_contains(&confirmation, "Congratulations")?;
            store.checkout.base().screenshot("order_confirmed").await
        })
        .await
}

pub async fn user_registration(store: &Storefront) -> StoreResult<()> {
    let report = store.report();

    report
        .run_step("Navigate to home page and signup", async {
            store.home.open().await?;
            store.home.click_signup_login().await
        })
        .await?;

    report
        .run_step(
            "Complete registration form",
            store.signup_login.complete_registration(&store.user),
        )
        .await?;

    report
        .run_step("Verify registration success", async {
            expect_that(
                store.home.is_user_logged_in(&store.user.name).await?,
                "User registration failed",
            )
        })
        .await
}

pub async fn add_products_to_cart(store: &Storefront) -> StoreResult<()> {
    let report = store.report();

    report
        .run_step("Navigate to products page", async {
            store.home.open().await?;
            store.home.click_products().await
        })
        .await?;

    report
        .run_step("Add 2 products", async {
            store.products.add_multiple_products(&PRODUCT_INDICES).await?;
            store.products.click_view_cart_modal().await
        })
        .await?;

    report
        .run_step("Verify cart contents", async {
            expect_that(
                store
                    .cart
                    .verify_cart_items_count(PRODUCT_INDICES.len())
                    .await?,
                "Cart item count mismatch",
            )?;
            store.cart.capture_cart_state().await
        })
        .await
}

/// Text body of the "Cart Details" attachment
fn cart_details(items: &[CartLineItem]) -> String {
    let mut details = String::from("Cart Contents:\n");
    for (position, item) in items.iter().enumerate() {
        details.push_str(&format!(
            "\nProduct {}:\n  Name: {}\n  Price: {}\n  Quantity: {}\n  Total: {}\n",
            position + 1,
            item.name,
            item.unit_price,
            item.quantity,
            item.line_total
        ));
    }
    details
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_labels() {
        assert_eq!(COMPLETE_PURCHASE_FLOW.severity, Severity::Critical);
        assert!(COMPLETE_PURCHASE_FLOW.has_marker("smoke"));
        assert!(COMPLETE_PURCHASE_FLOW.has_marker("regression"));
        assert_eq!(COMPLETE_PURCHASE_FLOW.markers, &["smoke", "regression"]);
        assert!(!COMPLETE_PURCHASE_FLOW.has_marker("checkout"));
        assert!(USER_REGISTRATION.has_marker("smoke"));
        assert!(!ADD_PRODUCTS_TO_CART.has_marker("smoke"));
        assert_eq!(ADD_PRODUCTS_TO_CART.feature, "Shopping Cart");
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = ALL.iter().map(|m| m.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_cart_details_lists_every_line() {
        let item = |name: &str, price: &str, qty: &str, total: &str| CartLineItem {
            name: name.to_string(),
            unit_price: price.to_string(),
            quantity: qty.to_string(),
            line_total: total.to_string(),
        };
        let text = cart_details(&[
            item("Blue Top", "Rs. 500", "1", "Rs. 500"),
            item("Men Tshirt", "Rs. 400", "2", "Rs. 800"),
        ]);
        assert!(text.starts_with("Cart Contents:\n\nProduct 1:\n  Name: Blue Top\n"));
        assert!(text.contains("\nProduct 2:\n  Name: Men Tshirt\n  Price: Rs. 400\n  Quantity: 2\n  Total: Rs. 800\n"));
        assert_eq!(cart_details(&[]), "Cart Contents:\n");
    }
}

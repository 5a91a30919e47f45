//! Checkout review, payment form and order confirmation.
//!
//! The flow only moves forward:
//!
//! ```text
//! cart review ──► place order ──► payment form ──► pay & confirm ──► confirmation
//! ```
//!
//! A failure at any stage aborts the whole composite action.

use crate::assertion::expect_that;
use crate::data::PaymentData;
use crate::page_object::{BasePage, PageObject};
use crate::result::StoreResult;
use tracing::{info, warn};

/// Selectors of `/checkout`, `/payment` and `/payment_done`
pub mod locators {
    pub const ADDRESS_DELIVERY: &str = ".address_delivery";
    pub const ADDRESS_INVOICE: &str = ".address_invoice";
    pub const ORDER_REVIEW: &str = "#cart_info";
    pub const COMMENT_TEXTAREA: &str = "textarea[name='message']";
    pub const PLACE_ORDER_BUTTON: &str = "a[href='/payment']";

    // Payment
    pub const NAME_ON_CARD_INPUT: &str = "input[name='name_on_card']";
    pub const CARD_NUMBER_INPUT: &str = "input[name='card_number']";
    pub const CVC_INPUT: &str = "input[name='cvc']";
    pub const EXPIRY_MONTH_INPUT: &str = "input[name='expiry_month']";
    pub const EXPIRY_YEAR_INPUT: &str = "input[name='expiry_year']";
    pub const PAY_CONFIRM_BUTTON: &str = "#submit";

    // Order confirmation
    pub const ORDER_PLACED_MESSAGE: &str =
        "p:has-text('Congratulations! Your order has been confirmed!')";
    pub const SUCCESS_MESSAGE: &str = ".alert-success";
    pub const DOWNLOAD_INVOICE_BUTTON: &str = "a[href='/download_invoice']";
    pub const CONTINUE_BUTTON: &str = "a[data-qa='continue-button']";
}

/// `/checkout` and the payment pages that follow it
#[derive(Debug, Clone)]
pub struct CheckoutPage {
    base: BasePage,
}

impl PageObject for CheckoutPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url_pattern(&self) -> &str {
        "/checkout"
    }
}

impl CheckoutPage {
    #[must_use]
    pub const fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub async fn is_delivery_address_visible(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::ADDRESS_DELIVERY).await
    }

    pub async fn is_invoice_address_visible(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::ADDRESS_INVOICE).await
    }

    pub async fn is_order_review_visible(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::ORDER_REVIEW).await
    }

    pub async fn add_order_comment(&self, comment: &str) -> StoreResult<()> {
        self.base
            .report()
            .run_step(
                format!("Add comment to order: {comment}"),
                self.base.fill(locators::COMMENT_TEXTAREA, comment),
            )
            .await
    }

    pub async fn click_place_order(&self) -> StoreResult<()> {
        self.base.click(locators::PLACE_ORDER_BUTTON).await
    }

    pub async fn fill_payment_information(&self, payment: &PaymentData) -> StoreResult<()> {
        self.base
            .report()
            .run_step("Fill payment information", async {
                let b = &self.base;
                b.fill(locators::NAME_ON_CARD_INPUT, &payment.name_on_card).await?;
                b.fill(locators::CARD_NUMBER_INPUT, &payment.card_number).await?;
                b.fill(locators::CVC_INPUT, &payment.cvc).await?;
                b.fill(locators::EXPIRY_MONTH_INPUT, &payment.expiry_month).await?;
                b.fill(locators::EXPIRY_YEAR_INPUT, &payment.expiry_year).await
            })
            .await
    }

    pub async fn click_pay_and_confirm(&self) -> StoreResult<()> {
        self.base.click(locators::PAY_CONFIRM_BUTTON).await
    }

    /// Whether the confirmation shows up within the order timeout
    ///
    /// Never fails: any error while waiting answers `false`.
    pub async fn is_order_placed(&self) -> bool {
        let timeout_ms = self.base.timeouts().order_confirmation_ms;
        let waited = self
            .base
            .report()
            .run_step(
                "Verify order is placed successfully",
                self.base.wait_for(locators::ORDER_PLACED_MESSAGE, timeout_ms),
            )
            .await;
        match waited {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "order confirmation not seen");
                false
            }
        }
    }

    /// Review, comment, place the order, pay and wait for the confirmation
    ///
    /// An empty `comment` leaves the comment box untouched.
    pub async fn complete_checkout(&self, payment: &PaymentData, comment: &str) -> StoreResult<()> {
        self.base
            .report()
            .run_step("Complete checkout process", async {
                info!("completing checkout");
                expect_that(
                    self.is_delivery_address_visible().await?,
                    "Delivery address not visible",
                )?;
                expect_that(
                    self.is_invoice_address_visible().await?,
                    "Invoice address not visible",
                )?;

                if !comment.is_empty() {
                    self.add_order_comment(comment).await?;
                }
                self.base.screenshot("before_checkout").await?;

                self.click_place_order().await?;
                self.base
                    .wait_for_element(locators::NAME_ON_CARD_INPUT)
                    .await?;

                self.fill_payment_information(payment).await?;
                self.base.screenshot("payment_filled").await?;

                self.click_pay_and_confirm().await?;
                self.base
                    .wait_for(
                        locators::ORDER_PLACED_MESSAGE,
                        self.base.timeouts().order_confirmation_ms,
                    )
                    .await?;
                self.base.screenshot("order_placed").await
            })
            .await
    }

    pub async fn get_confirmation_message(&self) -> StoreResult<String> {
        self.base.get_text(locators::ORDER_PLACED_MESSAGE).await
    }

    pub async fn download_invoice(&self) -> StoreResult<()> {
        self.base.click(locators::DOWNLOAD_INVOICE_BUTTON).await
    }

    pub async fn click_continue(&self) -> StoreResult<()> {
        self.base.click(locators::CONTINUE_BUTTON).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TestDataGenerator;
    use crate::driver::MockPage;
    use crate::report::{Report, TestMeta, TestStatus};
    use crate::result::StoreError;
    use std::sync::Arc;

    const PAYMENT_FIELDS: [&str; 6] = [
        locators::NAME_ON_CARD_INPUT,
        locators::CARD_NUMBER_INPUT,
        locators::CVC_INPUT,
        locators::EXPIRY_MONTH_INPUT,
        locators::EXPIRY_YEAR_INPUT,
        locators::PAY_CONFIRM_BUTTON,
    ];

    fn checkout_site() -> MockPage {
        MockPage::new()
            .with_element(locators::ADDRESS_DELIVERY, "Your delivery address")
            .with_element(locators::ADDRESS_INVOICE, "Your billing address")
            .with_element(locators::COMMENT_TEXTAREA, "")
            .with_element(locators::PLACE_ORDER_BUTTON, "Place Order")
            .on_click(locators::PLACE_ORDER_BUTTON, |dom| {
                for field in PAYMENT_FIELDS {
                    dom.show(field, "");
                }
            })
            .on_click(locators::PAY_CONFIRM_BUTTON, |dom| {
                dom.show(
                    locators::ORDER_PLACED_MESSAGE,
                    "Congratulations! Your order has been confirmed!",
                );
            })
    }

    fn checkout(page: &MockPage) -> CheckoutPage {
        CheckoutPage::new(BasePage::new(
            Arc::new(page.clone()),
            Report::new(&TestMeta::new("checkout")),
        ))
    }

    #[tokio::test]
    async fn test_complete_checkout() {
        let page = checkout_site();
        let checkout = checkout(&page);
        let payment = TestDataGenerator::from_seed(11).payment_data();

        checkout
            .complete_checkout(&payment, "Handle with care")
            .await
            .unwrap();

        assert_eq!(
            page.value_of(locators::CARD_NUMBER_INPUT).as_deref(),
            Some("4532015112830366")
        );
        assert_eq!(
            page.value_of(locators::COMMENT_TEXTAREA).as_deref(),
            Some("Handle with care")
        );
        assert!(checkout.is_order_placed().await);
        assert!(checkout
            .get_confirmation_message()
            .await
            .unwrap()
            .contains("Congratulations"));
        assert_eq!(
            checkout.base().report().attachment_names(),
            vec!["before_checkout", "payment_filled", "order_placed"]
        );
    }

    #[tokio::test]
    async fn test_empty_comment_is_skipped() {
        let page = checkout_site();
        let payment = TestDataGenerator::from_seed(2).payment_data();
        checkout(&page).complete_checkout(&payment, "").await.unwrap();
        assert!(!page.was_called("fill:textarea"));
    }

    #[tokio::test]
    async fn test_missing_address_fails_assertion() {
        let page = checkout_site();
        page.dom(|dom| dom.remove(locators::ADDRESS_INVOICE));
        let checkout = checkout(&page);
        let payment = TestDataGenerator::from_seed(2).payment_data();

        let err = checkout.complete_checkout(&payment, "").await.unwrap_err();
        assert!(matches!(err, StoreError::AssertionFailed { ref message } if message == "Invoice address not visible"));
        assert_eq!(
            checkout.base().report().snapshot().steps[0].status,
            TestStatus::Failed
        );
        assert!(!page.was_called("click:"));
    }

    #[tokio::test]
    async fn test_order_placed_is_false_on_timeout() {
        let page = MockPage::new();
        let checkout = checkout(&page);
        assert!(!checkout.is_order_placed().await);
        assert!(page.was_called("wait_for_visible:p:has-text"));
        assert_eq!(
            checkout.base().report().snapshot().steps[0].status,
            TestStatus::Broken
        );
    }

    #[tokio::test]
    async fn test_confirmation_never_shows() {
        let page = checkout_site().on_click(locators::PAY_CONFIRM_BUTTON, |dom| {
            dom.remove(locators::ORDER_PLACED_MESSAGE);
        });
        let payment = TestDataGenerator::from_seed(5).payment_data();
        let err = checkout(&page)
            .complete_checkout(&payment, "")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Timeout { ms: 15_000, .. }));
    }
}

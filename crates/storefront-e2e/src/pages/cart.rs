//! Shopping cart table.

use crate::locator::Locator;
use crate::page_object::{BasePage, PageObject};
use crate::result::StoreResult;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Selectors of `/view_cart`
pub mod locators {
    pub const CART_INFO_TABLE: &str = "#cart_info_table";
    pub const CART_ITEMS: &str = "tr.cart_menu ~ tr";
    pub const PRODUCT_NAME: &str = ".cart_description h4 a";
    pub const PRODUCT_PRICE: &str = ".cart_price p";
    pub const PRODUCT_QUANTITY: &str = ".cart_quantity button";
    pub const PRODUCT_TOTAL: &str = ".cart_total p";
    pub const PROCEED_TO_CHECKOUT_BUTTON: &str = ".btn-default.check_out";
    pub const REGISTER_LOGIN_LINK: &str = "a[href='/login']";
    pub const DELETE_PRODUCT_BUTTON: &str = ".cart_quantity_delete";
    pub const CART_EMPTY_TEXT: &str = "#empty_cart";
}

/// One row of the cart as rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub name: String,
    pub unit_price: String,
    pub quantity: String,
    pub line_total: String,
}

impl CartLineItem {
    /// Unit price as a number ("Rs. 500" -> 500)
    #[must_use]
    pub fn unit_price_value(&self) -> Option<u64> {
        amount(&self.unit_price)
    }

    /// Line total as a number
    #[must_use]
    pub fn line_total_value(&self) -> Option<u64> {
        amount(&self.line_total)
    }

    /// Quantity as a number
    #[must_use]
    pub fn quantity_value(&self) -> Option<u64> {
        amount(&self.quantity)
    }
}

fn digits() -> Option<&'static Regex> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

/// Digits of a rendered amount, ignoring currency and grouping
fn amount(text: &str) -> Option<u64> {
    let joined: String = digits()?.find_iter(text).map(|m| m.as_str()).collect();
    joined.parse().ok()
}

/// `/view_cart`
#[derive(Debug, Clone)]
pub struct CartPage {
    base: BasePage,
}

impl PageObject for CartPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url_pattern(&self) -> &str {
        "/view_cart"
    }
}

impl CartPage {
    #[must_use]
    pub const fn new(base: BasePage) -> Self {
        Self { base }
    }

    /// Number of product rows
    pub async fn get_cart_items_count(&self) -> StoreResult<usize> {
        self.base
            .report()
            .run_step("Get number of items in cart", self.base.count(locators::CART_ITEMS))
            .await
    }

    async fn cell_text(&self, field: &str, index: usize) -> StoreResult<String> {
        let text = self.base.get_text(Locator::new(field).nth(index)).await?;
        Ok(text.trim().to_string())
    }

    /// Product name of row `index` (0-based)
    pub async fn get_product_name(&self, index: usize) -> StoreResult<String> {
        self.cell_text(locators::PRODUCT_NAME, index).await
    }

    pub async fn get_product_price(&self, index: usize) -> StoreResult<String> {
        self.cell_text(locators::PRODUCT_PRICE, index).await
    }

    pub async fn get_product_quantity(&self, index: usize) -> StoreResult<String> {
        self.cell_text(locators::PRODUCT_QUANTITY, index).await
    }

    pub async fn get_product_total(&self, index: usize) -> StoreResult<String> {
        self.cell_text(locators::PRODUCT_TOTAL, index).await
    }

    pub async fn verify_cart_items_count(&self, expected: usize) -> StoreResult<bool> {
        self.base
            .report()
            .run_step(format!("Verify cart contains {expected} products"), async {
                let actual = self.get_cart_items_count().await?;
                debug!(expected, actual, "cart items");
                Ok(actual == expected)
            })
            .await
    }

    /// Read every row back
    ///
    /// Each field is a separate query, so a row that re-renders between
    /// reads can mix old and new values.
    pub async fn get_all_products_info(&self) -> StoreResult<Vec<CartLineItem>> {
        self.base
            .report()
            .run_step("Get all products in cart", async {
                let count = self.get_cart_items_count().await?;
                let mut items = Vec::with_capacity(count);
                for i in 0..count {
                    items.push(CartLineItem {
                        name: self.get_product_name(i).await?,
                        unit_price: self.get_product_price(i).await?,
                        quantity: self.get_product_quantity(i).await?,
                        line_total: self.get_product_total(i).await?,
                    });
                }
                Ok(items)
            })
            .await
    }

    pub async fn click_proceed_to_checkout(&self) -> StoreResult<()> {
        self.base.click(locators::PROCEED_TO_CHECKOUT_BUTTON).await
    }

    /// Login link of the "checkout requires an account" modal
    pub async fn click_register_login(&self) -> StoreResult<()> {
        self.base.click(locators::REGISTER_LOGIN_LINK).await
    }

    pub async fn capture_cart_state(&self) -> StoreResult<()> {
        self.base.screenshot("cart_state").await
    }

    pub async fn is_cart_not_empty(&self) -> StoreResult<bool> {
        Ok(self.get_cart_items_count().await? > 0)
    }

    /// Delete row `index` (0-based)
    pub async fn remove_product(&self, index: usize) -> StoreResult<()> {
        self.base
            .report()
            .run_step(
                format!("Remove product at index: {index}"),
                self.base
                    .click(Locator::new(locators::DELETE_PRODUCT_BUTTON).nth(index)),
            )
            .await
    }

    /// Whether the "Cart is empty!" notice shows
    pub async fn is_cart_empty(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::CART_EMPTY_TEXT).await
    }
}

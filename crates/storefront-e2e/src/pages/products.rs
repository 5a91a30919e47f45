//! Product listing with its add-to-cart modal.

use crate::locator::Locator;
use crate::page_object::{BasePage, PageObject};
use crate::result::{StoreError, StoreResult};
use tracing::info;

/// Selectors of `/products`
pub mod locators {
    pub const ALL_PRODUCTS_TITLE: &str = ".title.text-center";
    pub const PRODUCTS_LIST: &str = ".features_items";
    pub const PRODUCT_ITEM: &str = ".col-sm-4";
    pub const ADD_TO_CART_BUTTON: &str = ".overlay-content .add-to-cart";
    pub const CONTINUE_SHOPPING_BUTTON: &str = "button:has-text('Continue Shopping')";
    pub const VIEW_CART_MODAL_LINK: &str = "a:has-text('View Cart')";
    pub const SEARCH_INPUT: &str = "#search_product";
    pub const SEARCH_BUTTON: &str = "#submit_search";
}

/// `/products`: the catalogue grid
#[derive(Debug, Clone)]
pub struct ProductsPage {
    base: BasePage,
}

impl PageObject for ProductsPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url_pattern(&self) -> &str {
        "/products"
    }
}

impl ProductsPage {
    #[must_use]
    pub const fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub async fn is_products_page_loaded(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::ALL_PRODUCTS_TITLE).await
    }

    /// Tile of the `index`-th product, counting from 1
    ///
    /// Index 0 names no tile and fails as [`StoreError::ElementNotFound`].
    pub fn product_locator(index: usize) -> StoreResult<Locator> {
        let position = index.checked_sub(1).ok_or_else(|| StoreError::ElementNotFound {
            selector: format!("{} >> product 0 (positions start at 1)", locators::PRODUCT_ITEM),
        })?;
        Ok(Locator::new(locators::PRODUCT_ITEM).nth(position))
    }

    /// Add-to-cart button inside the `index`-th tile's overlay
    pub fn add_to_cart_locator(index: usize) -> StoreResult<Locator> {
        Ok(Self::product_locator(index)?.locator(locators::ADD_TO_CART_BUTTON))
    }

    /// Hover a tile to reveal its overlay
    pub async fn hover_on_product(&self, index: usize) -> StoreResult<()> {
        self.base.hover(Self::product_locator(index)?).await
    }

    /// Add the `index`-th product and wait for the confirmation modal
    pub async fn add_product_to_cart(&self, index: usize) -> StoreResult<()> {
        self.base
            .report()
            .run_step(format!("Add product to cart at index: {index}"), async {
                info!(index, "adding product to cart");
                self.hover_on_product(index).await?;
                self.base.click(Self::add_to_cart_locator(index)?).await?;
                self.base
                    .wait_for_element(locators::CONTINUE_SHOPPING_BUTTON)
                    .await?;
                self.base.screenshot(&format!("product_{index}_added")).await
            })
            .await
    }

    pub async fn click_continue_shopping(&self) -> StoreResult<()> {
        self.base.click(locators::CONTINUE_SHOPPING_BUTTON).await
    }

    pub async fn click_view_cart_modal(&self) -> StoreResult<()> {
        self.base.click(locators::VIEW_CART_MODAL_LINK).await
    }

    /// Add several products, dismissing the modal between them
    ///
    /// The modal stays open after the last product so the caller can go
    /// straight to the cart.
    pub async fn add_multiple_products(&self, indices: &[usize]) -> StoreResult<()> {
        self.base
            .report()
            .run_step(format!("Add multiple products to cart: {indices:?}"), async {
                for (position, &index) in indices.iter().enumerate() {
                    self.add_product_to_cart(index).await?;
                    if position + 1 < indices.len() {
                        self.click_continue_shopping().await?;
                    }
                }
                Ok(())
            })
            .await
    }

    pub async fn search(&self, term: &str) -> StoreResult<()> {
        self.base
            .report()
            .run_step(format!("Search products: {term}"), async {
                self.base.fill(locators::SEARCH_INPUT, term).await?;
                self.base.click(locators::SEARCH_BUTTON).await
            })
            .await
    }

    /// Number of product tiles currently rendered
    pub async fn product_count(&self) -> StoreResult<usize> {
        self.base.count(locators::PRODUCT_ITEM).await
    }
}

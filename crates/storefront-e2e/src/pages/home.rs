//! Home page: header navigation and the logged-in banner.

use crate::page_object::{BasePage, PageObject};
use crate::result::StoreResult;
use tracing::info;

/// Selectors of the home page and the shared header
pub mod locators {
    pub const SIGNUP_LOGIN_LINK: &str = "a[href='/login']";
    pub const PRODUCTS_LINK: &str = "a[href='/products']";
    pub const CART_LINK: &str = "a[href='/view_cart']";
    pub const HOME_LINK: &str = "a[href='/']";
    pub const LOGGED_IN_USER: &str = "a:has-text('Logged in as')";
    pub const DELETE_ACCOUNT_LINK: &str = "a[href='/delete_account']";
    pub const LOGOUT_LINK: &str = "a[href='/logout']";
    pub const ACCOUNT_DELETED: &str = "h2[data-qa='account-deleted']";
    pub const CONTINUE_BUTTON: &str = "a[data-qa='continue-button']";
}

/// Landing page of the storefront
#[derive(Debug, Clone)]
pub struct HomePage {
    base: BasePage,
}

impl PageObject for HomePage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url_pattern(&self) -> &str {
        "/"
    }
}

impl HomePage {
    #[must_use]
    pub const fn new(base: BasePage) -> Self {
        Self { base }
    }

    pub async fn click_signup_login(&self) -> StoreResult<()> {
        self.base.click(locators::SIGNUP_LOGIN_LINK).await
    }

    pub async fn click_products(&self) -> StoreResult<()> {
        self.base.click(locators::PRODUCTS_LINK).await
    }

    pub async fn click_cart(&self) -> StoreResult<()> {
        self.base.click(locators::CART_LINK).await
    }

    pub async fn click_home(&self) -> StoreResult<()> {
        self.base.click(locators::HOME_LINK).await
    }

    pub async fn click_logout(&self) -> StoreResult<()> {
        self.base.click(locators::LOGOUT_LINK).await
    }

    pub async fn click_delete_account(&self) -> StoreResult<()> {
        self.base.click(locators::DELETE_ACCOUNT_LINK).await
    }

    /// Whether the header reads "Logged in as <username>"
    ///
    /// Waits up to the default timeout for the banner to render. A banner
    /// that never shows answers `false`; other driver failures are errors.
    pub async fn is_user_logged_in(&self, username: &str) -> StoreResult<bool> {
        self.base
            .report()
            .run_step(format!("Verify user is logged in as: {username}"), async {
                match self.base.wait_for_element(locators::LOGGED_IN_USER).await {
                    Ok(()) => {}
                    Err(e) if e.is_timeout() => return Ok(false),
                    Err(e) => return Err(e),
                }
                let banner = self.base.get_text(locators::LOGGED_IN_USER).await?;
                Ok(banner.contains(username))
            })
            .await
    }

    /// Delete the logged-in account and dismiss the confirmation
    pub async fn delete_account(&self) -> StoreResult<()> {
        self.base
            .report()
            .run_step("Delete account", async {
                info!("deleting account");
                self.click_delete_account().await?;
                self.base.wait_for_element(locators::ACCOUNT_DELETED).await?;
                self.base.click(locators::CONTINUE_BUTTON).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MockPage;
    use crate::report::{Report, TestMeta};
    use std::sync::Arc;

    fn home(page: &MockPage) -> HomePage {
        HomePage::new(BasePage::new(
            Arc::new(page.clone()),
            Report::new(&TestMeta::new("home")),
        ))
    }

    #[tokio::test]
    async fn test_open_navigates_to_root() {
        let page = MockPage::new();
        home(&page).open().await.unwrap();
        assert!(page.was_called("goto:https://www.automationexercise.com"));
    }

    #[tokio::test]
    async fn test_logged_in_banner() {
        let page = MockPage::new().with_element(locators::LOGGED_IN_USER, "Logged in as Ada Lovelace");
        let home = home(&page);
        assert!(home.is_user_logged_in("Ada Lovelace").await.unwrap());
        assert!(!home.is_user_logged_in("Grace Hopper").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_banner_is_false_not_error() {
        let page = MockPage::new();
        assert!(!home(&page).is_user_logged_in("Ada").await.unwrap());
    }

    #[tokio::test]
    async fn test_banner_rendered_during_wait_counts() {
        let page = MockPage::new().on_wait(locators::LOGGED_IN_USER, |dom| {
            dom.show(locators::LOGGED_IN_USER, "Logged in as Ada Lovelace");
        });
        assert!(home(&page).is_user_logged_in("Ada Lovelace").await.unwrap());

        let history = page.history();
        let waited = history
            .iter()
            .position(|c| c == "wait_for_visible:a:has-text('Logged in as')")
            .unwrap();
        let read = history
            .iter()
            .position(|c| c == "inner_text:a:has-text('Logged in as')")
            .unwrap();
        assert!(waited < read);
    }

    #[tokio::test]
    async fn test_delete_account_flow() {
        let page = MockPage::new()
            .with_element(locators::DELETE_ACCOUNT_LINK, "Delete Account")
            .on_click(locators::DELETE_ACCOUNT_LINK, |dom| {
                dom.show(locators::ACCOUNT_DELETED, "Account Deleted!");
                dom.show(locators::CONTINUE_BUTTON, "Continue");
            });
        home(&page).delete_account().await.unwrap();
        assert!(page.was_called("click:a[data-qa='continue-button']"));
    }

    #[tokio::test]
    async fn test_nav_link_missing_is_error() {
        let page = MockPage::new();
        let err = home(&page).click_products().await.unwrap_err();
        assert!(err.is_element_not_found());
    }
}

//! Signup / login page and the account-creation form behind it.

use crate::data::UserData;
use crate::page_object::{BasePage, PageObject};
use crate::result::StoreResult;
use tracing::info;

/// Selectors of `/login`, `/signup` and `/account_created`
pub mod locators {
    // New user signup
    pub const SIGNUP_NAME_INPUT: &str = "input[data-qa='signup-name']";
    pub const SIGNUP_EMAIL_INPUT: &str = "input[data-qa='signup-email']";
    pub const SIGNUP_BUTTON: &str = "button[data-qa='signup-button']";

    // Login
    pub const LOGIN_EMAIL_INPUT: &str = "input[data-qa='login-email']";
    pub const LOGIN_PASSWORD_INPUT: &str = "input[data-qa='login-password']";
    pub const LOGIN_BUTTON: &str = "button[data-qa='login-button']";
    pub const LOGIN_ERROR: &str = "p:has-text('Your email or password is incorrect!')";

    // Account information
    pub const GENDER_MR_RADIO: &str = "#id_gender1";
    pub const GENDER_MRS_RADIO: &str = "#id_gender2";
    pub const PASSWORD_INPUT: &str = "#password";
    pub const DAY_DROPDOWN: &str = "#days";
    pub const MONTH_DROPDOWN: &str = "#months";
    pub const YEAR_DROPDOWN: &str = "#years";
    pub const NEWSLETTER_CHECKBOX: &str = "#newsletter";
    pub const OFFERS_CHECKBOX: &str = "#optin";

    // Address information
    pub const FIRST_NAME_INPUT: &str = "#first_name";
    pub const LAST_NAME_INPUT: &str = "#last_name";
    pub const COMPANY_INPUT: &str = "#company";
    pub const ADDRESS1_INPUT: &str = "#address1";
    pub const ADDRESS2_INPUT: &str = "#address2";
    pub const COUNTRY_DROPDOWN: &str = "#country";
    pub const STATE_INPUT: &str = "#state";
    pub const CITY_INPUT: &str = "#city";
    pub const ZIPCODE_INPUT: &str = "#zipcode";
    pub const MOBILE_INPUT: &str = "#mobile_number";

    pub const CREATE_ACCOUNT_BUTTON: &str = "button[data-qa='create-account']";

    // Account created
    pub const ACCOUNT_CREATED_MESSAGE: &str = "h2[data-qa='account-created']";
    pub const CONTINUE_BUTTON: &str = "a[data-qa='continue-button']";
}

/// `/login`: signup and login forms
#[derive(Debug, Clone)]
pub struct SignupLoginPage {
    base: BasePage,
}

impl PageObject for SignupLoginPage {
    fn base(&self) -> &BasePage {
        &self.base
    }

    fn url_pattern(&self) -> &str {
        "/login"
    }
}

impl SignupLoginPage {
    #[must_use]
    pub const fn new(base: BasePage) -> Self {
        Self { base }
    }

    /// Enter name and email and submit the signup form
    pub async fn fill_signup_form(&self, name: &str, email: &str) -> StoreResult<()> {
        self.base
            .report()
            .run_step(
                format!("Fill signup form with name: {name} and email: {email}"),
                async {
                    self.base.fill(locators::SIGNUP_NAME_INPUT, name).await?;
                    self.base.fill(locators::SIGNUP_EMAIL_INPUT, email).await?;
                    self.base.click(locators::SIGNUP_BUTTON).await
                },
            )
            .await
    }

    /// Title, password, date of birth and both opt-ins
    pub async fn fill_account_information(&self, user: &UserData) -> StoreResult<()> {
        self.base
            .report()
            .run_step("Fill account information", async {
                self.base.click(locators::GENDER_MR_RADIO).await?;
                self.base.fill(locators::PASSWORD_INPUT, &user.password).await?;
                self.base.select_option(locators::DAY_DROPDOWN, &user.day).await?;
                self.base.select_option(locators::MONTH_DROPDOWN, &user.month).await?;
                self.base.select_option(locators::YEAR_DROPDOWN, &user.year).await?;
                self.base.click(locators::NEWSLETTER_CHECKBOX).await?;
                self.base.click(locators::OFFERS_CHECKBOX).await
            })
            .await
    }

    pub async fn fill_address_information(&self, user: &UserData) -> StoreResult<()> {
        self.base
            .report()
            .run_step("Fill address information", async {
                let b = &self.base;
                b.fill(locators::FIRST_NAME_INPUT, &user.first_name).await?;
                b.fill(locators::LAST_NAME_INPUT, &user.last_name).await?;
                b.fill(locators::COMPANY_INPUT, &user.company).await?;
                b.fill(locators::ADDRESS1_INPUT, &user.address1).await?;
                b.fill(locators::ADDRESS2_INPUT, &user.address2).await?;
                b.select_option(locators::COUNTRY_DROPDOWN, &user.country).await?;
                b.fill(locators::STATE_INPUT, &user.state).await?;
                b.fill(locators::CITY_INPUT, &user.city).await?;
                b.fill(locators::ZIPCODE_INPUT, &user.zipcode).await?;
                b.fill(locators::MOBILE_INPUT, &user.mobile).await
            })
            .await
    }

    pub async fn click_create_account(&self) -> StoreResult<()> {
        self.base.click(locators::CREATE_ACCOUNT_BUTTON).await
    }

    pub async fn is_account_created(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::ACCOUNT_CREATED_MESSAGE).await
    }

    pub async fn click_continue(&self) -> StoreResult<()> {
        self.base.click(locators::CONTINUE_BUTTON).await
    }

    /// Sign up, fill both forms, create the account and continue home
    pub async fn complete_registration(&self, user: &UserData) -> StoreResult<()> {
        self.base
            .report()
            .run_step("Complete registration process", async {
                info!(email = %user.email, "registering user");
                self.fill_signup_form(&user.name, &user.email).await?;
                self.base.wait_for_element(locators::PASSWORD_INPUT).await?;
                self.fill_account_information(user).await?;
                self.fill_address_information(user).await?;
                self.click_create_account().await?;
                self.base
                    .wait_for_element(locators::ACCOUNT_CREATED_MESSAGE)
                    .await?;
                self.base.screenshot("account_created").await?;
                self.click_continue().await
            })
            .await
    }

    /// Log in an existing user
    pub async fn login(&self, email: &str, password: &str) -> StoreResult<()> {
        self.base
            .report()
            .run_step(format!("Login with email: {email}"), async {
                self.base.fill(locators::LOGIN_EMAIL_INPUT, email).await?;
                self.base.fill(locators::LOGIN_PASSWORD_INPUT, password).await?;
                self.base.click(locators::LOGIN_BUTTON).await
            })
            .await
    }

    pub async fn is_login_error_visible(&self) -> StoreResult<bool> {
        self.base.is_visible(locators::LOGIN_ERROR).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TestDataGenerator;
    use crate::driver::MockPage;
    use crate::report::{Report, TestMeta, TestStatus};
    use std::sync::Arc;

    const FORM_FIELDS: [&str; 18] = [
        locators::GENDER_MR_RADIO,
        locators::PASSWORD_INPUT,
        locators::DAY_DROPDOWN,
        locators::MONTH_DROPDOWN,
        locators::YEAR_DROPDOWN,
        locators::NEWSLETTER_CHECKBOX,
        locators::OFFERS_CHECKBOX,
        locators::FIRST_NAME_INPUT,
        locators::LAST_NAME_INPUT,
        locators::COMPANY_INPUT,
        locators::ADDRESS1_INPUT,
        locators::ADDRESS2_INPUT,
        locators::COUNTRY_DROPDOWN,
        locators::STATE_INPUT,
        locators::CITY_INPUT,
        locators::ZIPCODE_INPUT,
        locators::MOBILE_INPUT,
        locators::CREATE_ACCOUNT_BUTTON,
    ];

    fn signup_site() -> MockPage {
        MockPage::new()
            .with_element(locators::SIGNUP_NAME_INPUT, "")
            .with_element(locators::SIGNUP_EMAIL_INPUT, "")
            .with_element(locators::SIGNUP_BUTTON, "Signup")
            .on_click(locators::SIGNUP_BUTTON, |dom| {
                for field in FORM_FIELDS {
                    dom.show(field, "");
                }
            })
            .on_click(locators::CREATE_ACCOUNT_BUTTON, |dom| {
                dom.show(locators::ACCOUNT_CREATED_MESSAGE, "Account Created!");
                dom.show(locators::CONTINUE_BUTTON, "Continue");
            })
    }

    fn signup(page: &MockPage) -> SignupLoginPage {
        SignupLoginPage::new(BasePage::new(
            Arc::new(page.clone()),
            Report::new(&TestMeta::new("signup")),
        ))
    }

    #[tokio::test]
    async fn test_complete_registration_fills_every_field() {
        let page = signup_site();
        let signup = signup(&page);
        let user = TestDataGenerator::from_seed(7).user_data();

        signup.complete_registration(&user).await.unwrap();

        assert_eq!(page.value_of(locators::SIGNUP_EMAIL_INPUT), Some(user.email.clone()));
        assert_eq!(page.value_of(locators::DAY_DROPDOWN), Some(user.day.clone()));
        assert_eq!(page.value_of(locators::COUNTRY_DROPDOWN).as_deref(), Some("India"));
        assert_eq!(page.value_of(locators::MOBILE_INPUT), Some(user.mobile.clone()));
        assert!(signup.is_account_created().await.unwrap());
        assert!(page.was_called("click:a[data-qa='continue-button']"));
        assert_eq!(page.screenshots_taken(), 1);
    }

    #[tokio::test]
    async fn test_registration_steps_are_nested() {
        let page = signup_site();
        let signup = signup(&page);
        let user = TestDataGenerator::from_seed(1).user_data();
        signup.complete_registration(&user).await.unwrap();

        let steps = signup.base().report().snapshot().steps;
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].name, "Complete registration process");
        let inner: Vec<&str> = steps[0].steps.iter().map(|s| s.name.as_str()).collect();
        assert!(inner.contains(&"Fill account information"));
        assert!(inner.contains(&"Take screenshot: account_created"));
    }

    #[tokio::test]
    async fn test_form_never_appears_times_out() {
        let page = MockPage::new()
            .with_element(locators::SIGNUP_NAME_INPUT, "")
            .with_element(locators::SIGNUP_EMAIL_INPUT, "")
            .with_element(locators::SIGNUP_BUTTON, "Signup");
        let signup = signup(&page);
        let user = TestDataGenerator::from_seed(3).user_data();

        let err = signup.complete_registration(&user).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(
            signup.base().report().snapshot().steps[0].status,
            TestStatus::Broken
        );
    }

    #[tokio::test]
    async fn test_login_error_banner() {
        let page = MockPage::new()
            .with_element(locators::LOGIN_EMAIL_INPUT, "")
            .with_element(locators::LOGIN_PASSWORD_INPUT, "")
            .with_element(locators::LOGIN_BUTTON, "Login")
            .on_click(locators::LOGIN_BUTTON, |dom| {
                dom.show(locators::LOGIN_ERROR, "Your email or password is incorrect!");
            });
        let signup = signup(&page);
        assert!(!signup.is_login_error_visible().await.unwrap());
        signup.login("nobody@testmail.com", "wrong").await.unwrap();
        assert!(signup.is_login_error_visible().await.unwrap());
    }
}

//! Concrete page objects of the storefront.
//!
//! Each page owns a [`BasePage`](crate::page_object::BasePage) and a
//! `locators` module of selector constants. Composite actions run as one
//! report step wrapping the primitive steps they are made of.

pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod signup_login;

pub use cart::{CartLineItem, CartPage};
pub use checkout::CheckoutPage;
pub use home::HomePage;
pub use products::ProductsPage;
pub use signup_login::SignupLoginPage;

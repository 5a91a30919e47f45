//! Synthetic test data.
//!
//! A [`TestDataGenerator`] owns its random source, so a run is reproducible
//! from a seed (`STOREFRONT_SEED`) while the free functions keep the
//! "fresh data every call" behaviour.

use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Non-functional card number accepted by the demo payment form
pub const TEST_CARD_NUMBER: &str = "4532015112830366";
pub const TEST_CVC: &str = "123";
pub const TEST_EXPIRY_MONTH: &str = "12";
pub const TEST_EXPIRY_YEAR: &str = "2027";

/// Password every generated account uses
pub const DEFAULT_PASSWORD: &str = "Test@123456";
pub const DEFAULT_COUNTRY: &str = "India";
pub const EMAIL_DOMAIN: &str = "testmail.com";

/// Delivery notes an order comment is drawn from
pub const ORDER_COMMENTS: [&str; 5] = [
    "Please deliver between 9 AM - 5 PM",
    "Handle with care",
    "Gift wrapping required",
    "Leave at the door if no one is home",
    "Call before delivery",
];

const FIRST_NAMES: &[&str] = &[
    "Aarav", "Ada", "Amelia", "Arjun", "Chloe", "Diego", "Elena", "Farah", "Grace", "Hugo",
    "Isha", "James", "Kavya", "Liam", "Maya", "Noah", "Olivia", "Priya", "Rohan", "Sofia",
];

const LAST_NAMES: &[&str] = &[
    "Anderson", "Bose", "Carter", "Das", "Evans", "Fischer", "Gupta", "Hughes", "Iyer", "Jensen",
    "Khan", "Lopez", "Mehta", "Nair", "Owens", "Patel", "Quinn", "Reddy", "Singh", "Turner",
];

const COMPANIES: &[&str] = &[
    "Acme Logistics", "Bluefin Labs", "Cedar Holdings", "Delta Textiles", "Evergreen Foods",
    "Falcon Systems", "Granite Works", "Harbor Retail",
];

const STREETS: &[&str] = &[
    "MG Road", "Park Street", "Linking Road", "Brigade Road", "Anna Salai", "Residency Road",
    "Church Street", "Station Road",
];

const UNIT_KINDS: &[&str] = &["Apt.", "Suite", "Flat", "Floor"];

const STATES: &[&str] = &[
    "Karnataka", "Maharashtra", "Tamil Nadu", "Kerala", "Telangana", "Gujarat", "Punjab",
    "West Bengal",
];

const CITIES: &[&str] = &[
    "Bengaluru", "Mumbai", "Chennai", "Kochi", "Hyderabad", "Ahmedabad", "Amritsar", "Kolkata",
];

const EMAIL_SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const PASSWORD_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Registration details for one new account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    /// Display name used on the signup form ("First Last")
    pub name: String,
    pub email: String,
    pub password: String,
    /// Day of birth, 1-28
    pub day: String,
    /// Month of birth, 1-12
    pub month: String,
    /// Year of birth, 1970-2000
    pub year: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address1: String,
    pub address2: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub zipcode: String,
    /// Ten digits
    pub mobile: String,
}

/// Card details for the payment form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentData {
    pub name_on_card: String,
    pub card_number: String,
    pub cvc: String,
    pub expiry_month: String,
    pub expiry_year: String,
}

/// Random source for test data
#[derive(Debug, Clone)]
pub struct TestDataGenerator {
    rng: StdRng,
}

impl TestDataGenerator {
    /// Reproducible generator
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generator seeded from the OS
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, otherwise from the OS
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    fn pick(&mut self, words: &[&'static str]) -> &'static str {
        words.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn chars_from(&mut self, alphabet: &[u8], len: usize) -> String {
        let index = Uniform::from(0..alphabet.len());
        (0..len)
            .map(|_| char::from(alphabet[index.sample(&mut self.rng)]))
            .collect()
    }

    fn digits(&mut self, len: usize) -> String {
        self.chars_from(b"0123456789", len)
    }

    fn email_for(&mut self, first: &str, last: &str) -> String {
        let suffix = self.chars_from(EMAIL_SUFFIX_CHARS, 8);
        format!(
            "{}.{}.{suffix}@{EMAIL_DOMAIN}",
            first.to_lowercase(),
            last.to_lowercase()
        )
    }

    /// `first.last.<8 random chars>@testmail.com`
    pub fn random_email(&mut self) -> String {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        self.email_for(first, last)
    }

    /// ASCII letters and digits
    pub fn random_password(&mut self, len: usize) -> String {
        self.chars_from(PASSWORD_CHARS, len)
    }

    /// A complete registration record
    pub fn user_data(&mut self) -> UserData {
        let first_name = self.pick(FIRST_NAMES);
        let last_name = self.pick(LAST_NAMES);
        let email = self.email_for(first_name, last_name);
        let house = self.rng.gen_range(1..=999);
        let street = self.pick(STREETS);
        let unit_kind = self.pick(UNIT_KINDS);
        let unit = self.rng.gen_range(1..=99);

        UserData {
            name: format!("{first_name} {last_name}"),
            email,
            password: DEFAULT_PASSWORD.to_string(),
            day: self.rng.gen_range(1..=28_u32).to_string(),
            month: self.rng.gen_range(1..=12_u32).to_string(),
            year: self.rng.gen_range(1970..=2000_u32).to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            company: self.pick(COMPANIES).to_string(),
            address1: format!("{house} {street}"),
            address2: format!("{unit_kind} {unit}"),
            country: DEFAULT_COUNTRY.to_string(),
            state: self.pick(STATES).to_string(),
            city: self.pick(CITIES).to_string(),
            zipcode: self.digits(6),
            mobile: self.digits(10),
        }
    }

    /// Card details with the fixed test card
    pub fn payment_data(&mut self) -> PaymentData {
        let first = self.pick(FIRST_NAMES);
        let last = self.pick(LAST_NAMES);
        PaymentData {
            name_on_card: format!("{first} {last}"),
            card_number: TEST_CARD_NUMBER.to_string(),
            cvc: TEST_CVC.to_string(),
            expiry_month: TEST_EXPIRY_MONTH.to_string(),
            expiry_year: TEST_EXPIRY_YEAR.to_string(),
        }
    }

    /// One of [`ORDER_COMMENTS`], uniformly
    pub fn comment(&mut self) -> &'static str {
        self.pick(&ORDER_COMMENTS)
    }
}

impl Default for TestDataGenerator {
    fn default() -> Self {
        Self::from_entropy()
    }
}

pub fn generate_random_email() -> String {
    TestDataGenerator::from_entropy().random_email()
}

pub fn generate_random_password(len: usize) -> String {
    TestDataGenerator::from_entropy().random_password(len)
}

pub fn generate_user_data() -> UserData {
    TestDataGenerator::from_entropy().user_data()
}

pub fn generate_payment_data() -> PaymentData {
    TestDataGenerator::from_entropy().payment_data()
}

pub fn get_test_comment() -> &'static str {
    TestDataGenerator::from_entropy().comment()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use regex::Regex;
    use std::collections::HashSet;

    fn email_pattern() -> Regex {
        Regex::new(r"^[a-z]+\.[a-z]+\.[a-z0-9]{8}@testmail\.com$").unwrap()
    }

    mod generator_tests {
        use super::*;

        #[test]
        fn test_user_data_shape() {
            let user = TestDataGenerator::from_seed(42).user_data();
            assert_eq!(user.name, format!("{} {}", user.first_name, user.last_name));
            assert_eq!(user.password, "Test@123456");
            assert_eq!(user.country, "India");
            assert_eq!(user.mobile.len(), 10);
            assert!(user.mobile.chars().all(|c| c.is_ascii_digit()));
            assert!(user.email.starts_with(&user.first_name.to_lowercase()));
        }

        #[test]
        fn test_same_seed_same_data() {
            let a = TestDataGenerator::from_seed(7).user_data();
            let b = TestDataGenerator::from_seed(7).user_data();
            assert_eq!(a, b);
            assert_ne!(a, TestDataGenerator::from_seed(8).user_data());
        }

        #[test]
        fn test_password_charset() {
            let password = TestDataGenerator::from_seed(1).random_password(10);
            assert_eq!(password.len(), 10);
            assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(generate_random_password(0).is_empty());
        }

        #[test]
        fn test_comment_coverage() {
            let mut data = TestDataGenerator::from_seed(2024);
            let seen: HashSet<&str> = (0..1000).map(|_| data.comment()).collect();
            assert_eq!(seen.len(), 5);
            assert!(seen.iter().all(|c| ORDER_COMMENTS.contains(c)));
        }

        #[test]
        fn test_free_functions_vary() {
            let emails: HashSet<String> = (0..50).map(|_| generate_random_email()).collect();
            assert_eq!(emails.len(), 50);
            assert!(ORDER_COMMENTS.contains(&get_test_comment()));
            assert_eq!(generate_payment_data().card_number, TEST_CARD_NUMBER);
            assert_eq!(generate_user_data().country, DEFAULT_COUNTRY);
        }
    }

    proptest! {
        #[test]
        fn prop_email_is_well_formed(seed in any::<u64>()) {
            let mut data = TestDataGenerator::from_seed(seed);
            let pattern = email_pattern();
            prop_assert!(pattern.is_match(&data.random_email()));
            prop_assert!(pattern.is_match(&data.user_data().email));
        }

        #[test]
        fn prop_payment_uses_test_card(seed in any::<u64>()) {
            let payment = TestDataGenerator::from_seed(seed).payment_data();
            prop_assert_eq!(payment.card_number.as_str(), "4532015112830366");
            prop_assert_eq!(payment.cvc.as_str(), "123");
            prop_assert_eq!(payment.expiry_month.as_str(), "12");
            prop_assert_eq!(payment.expiry_year.as_str(), "2027");
        }

        #[test]
        fn prop_birth_date_in_range(seed in any::<u64>()) {
            let user = TestDataGenerator::from_seed(seed).user_data();
            let day: u32 = user.day.parse().unwrap();
            let month: u32 = user.month.parse().unwrap();
            let year: u32 = user.year.parse().unwrap();
            prop_assert!((1..=28).contains(&day));
            prop_assert!((1..=12).contains(&month));
            prop_assert!((1970..=2000).contains(&year));
        }
    }
}

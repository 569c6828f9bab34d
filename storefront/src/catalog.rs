//! Product catalog.
//!
//! The catalog is supplied once at startup and never mutated. Cart items copy
//! the fields they need from a [`Product`] when it is added.

use crate::types::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A license product offered by the store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Unique product id
    pub id: ProductId,
    /// Display title
    pub title: String,
    /// Short description
    pub description: String,
    /// Unit price
    pub price: Money,
    /// Price before discount, shown crossed out
    pub original_price: Money,
    /// Feature bullet points
    pub features: Vec<String>,
    /// Highlighted as the popular choice
    pub popular: bool,
}

impl Product {
    /// Discount against the original price, in whole percent (rounded half-up)
    ///
    /// Returns 0 when there is no original price or it is not above the
    /// current price.
    #[must_use]
    pub fn discount_percent(&self) -> u64 {
        let original = self.original_price.minor();
        if original == 0 || original <= self.price.minor() {
            return 0;
        }
        let saved = u128::from(original - self.price.minor());
        let original = u128::from(original);
        u64::try_from((saved * 200 + original) / (original * 2)).unwrap_or(0)
    }
}

/// Immutable, ordered list of products
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Creates a catalog from a product list, keeping its order
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The license products sold by KeyStore
    #[must_use]
    pub fn seed() -> Self {
        Self::new(vec![
            product(
                1,
                "Windows 11 Home",
                "Для домашнего использования",
                4990,
                7990,
                &["Безлимитная лицензия", "Цифровая доставка", "Техподдержка 24/7"],
                false,
            ),
            product(
                2,
                "Windows 11 Pro",
                "Для бизнеса и профессионалов",
                7990,
                12990,
                &[
                    "Расширенная безопасность",
                    "Управление доменом",
                    "BitLocker",
                    "Hyper-V",
                ],
                true,
            ),
            product(
                3,
                "Windows 11 Pro for Workstations",
                "Для рабочих станций",
                12990,
                18990,
                &["До 6ТБ RAM", "До 4 процессоров", "ReFS файловая система"],
                false,
            ),
        ])
    }

    /// All products in display order
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Looks up a product by id
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Title for a product id, if it exists
    #[must_use]
    pub fn title(&self, id: ProductId) -> Option<&str> {
        self.get(id).map(|p| p.title.as_str())
    }

    /// Number of products
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Checks if the catalog has no products
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

fn product(
    id: u32,
    title: &str,
    description: &str,
    price: u64,
    original_price: u64,
    features: &[&str],
    popular: bool,
) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        description: description.to_string(),
        price: Money::from_minor(price),
        original_price: Money::from_minor(original_price),
        features: features.iter().map(ToString::to_string).collect(),
        popular,
    }
}

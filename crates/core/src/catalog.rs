use rust_decimal::Decimal;

use crate::domain::product::{Product, ProductId};

#[derive(Clone, Debug, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// The storefront's fixed bag range.
    pub fn standard() -> Self {
        let entry = |id: &str, name: &str, category: &str, cents: i64, in_stock: bool| Product {
            id: ProductId(id.to_owned()),
            name: name.to_owned(),
            category: category.to_owned(),
            price: Decimal::new(cents, 2),
            in_stock,
        };

        Self::new(vec![
            entry("1", "Executive Leather Briefcase", "Briefcases", 29_999, true),
            entry("2", "Urban Travel Backpack", "Backpacks", 14_999, true),
            entry("3", "Classic Tote Bag", "Totes", 18_999, true),
            entry("4", "Vintage Messenger Bag", "Messenger", 17_999, true),
            entry("5", "Weekend Duffle Bag", "Duffle", 22_999, false),
            entry("6", "Minimalist Laptop Sleeve", "Accessories", 7_999, true),
        ])
    }

    pub fn find(&self, product_id: &ProductId) -> Option<&Product> {
        self.products.iter().find(|product| &product.id == product_id)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::Catalog;
    use crate::domain::product::ProductId;

    #[test]
    fn standard_catalog_resolves_known_products() {
        let catalog = Catalog::standard();
        let briefcase = catalog.find(&ProductId("1".to_owned())).expect("briefcase listed");

        assert_eq!(briefcase.name, "Executive Leather Briefcase");
        assert_eq!(briefcase.price, Decimal::new(29_999, 2));
        assert!(catalog.find(&ProductId("99".to_owned())).is_none());
    }
}

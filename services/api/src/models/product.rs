//! Catalog models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Product as stored and returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub in_stock: bool,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for product listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    /// Exact brand match
    pub brand: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    /// Case-insensitive substring over name or description
    pub search: Option<String>,
}

impl ProductQuery {
    /// Trim every filter and drop the empty ones, so `?brand=` means no filter
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            brand: clean(self.brand),
            category: clean(self.category),
            search: clean(self.search),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(brand) = &self.brand {
            if product.brand.as_deref() != Some(brand.as_str()) {
                return false;
            }
        }

        if let Some(category) = &self.category {
            if product.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }

        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_name && !in_description {
                return false;
            }
        }

        true
    }
}

/// Fields for inserting a product
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub in_stock: bool,
    pub rating: f64,
}

/// Partial product update; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
    pub rating: Option<f64>,
}

impl ProductUpdate {
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = Some(description.clone());
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
        if let Some(brand) = &self.brand {
            product.brand = Some(brand.clone());
        }
        if let Some(category) = &self.category {
            product.category = Some(category.clone());
        }
        if let Some(in_stock) = self.in_stock {
            product.in_stock = in_stock;
        }
        if let Some(rating) = self.rating {
            product.rating = rating;
        }
    }
}

/// Text fields of a multipart product form
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    fields: HashMap<String, String>,
}

impl ProductForm {
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// A field's trimmed value, with empty treated as absent
    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn price(&self) -> Result<Option<f64>, ApiError> {
        self.text("price")
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite() && *p >= 0.0)
                    .ok_or_else(|| ApiError::Validation("Price must be a number".to_string()))
            })
            .transpose()
    }

    fn rating(&self) -> Result<Option<f64>, ApiError> {
        self.text("rating")
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|r| (0.0..=5.0).contains(r))
                    .ok_or_else(|| {
                        ApiError::Validation("Rating must be between 0 and 5".to_string())
                    })
            })
            .transpose()
    }

    fn in_stock(&self) -> Result<Option<bool>, ApiError> {
        self.text("inStock")
            .map(|raw| match raw.to_lowercase().as_str() {
                "true" | "1" | "on" => Ok(true),
                "false" | "0" | "off" => Ok(false),
                _ => Err(ApiError::Validation(
                    "inStock must be true or false".to_string(),
                )),
            })
            .transpose()
    }

    /// Build an insert from the form; `name` and `price` are required
    pub fn into_new_product(self, image: Option<String>) -> Result<NewProduct, ApiError> {
        let name = self
            .text("name")
            .ok_or_else(|| ApiError::Validation("Product name is required".to_string()))?;
        let price = self
            .price()?
            .ok_or_else(|| ApiError::Validation("Price must be a number".to_string()))?;

        Ok(NewProduct {
            name,
            description: self.text("description"),
            price,
            image,
            brand: self.text("brand"),
            category: self.text("category"),
            in_stock: self.in_stock()?.unwrap_or(true),
            rating: self.rating()?.unwrap_or(0.0),
        })
    }

    /// Build a partial update from whatever fields were sent
    pub fn into_update(self, image: Option<String>) -> Result<ProductUpdate, ApiError> {
        Ok(ProductUpdate {
            name: self.text("name"),
            description: self.text("description"),
            price: self.price()?,
            image,
            brand: self.text("brand"),
            category: self.text("category"),
            in_stock: self.in_stock()?,
            rating: self.rating()?,
        })
    }
}

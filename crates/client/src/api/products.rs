//! Inventory endpoints.

use radapos_core::{Money, ProductId};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Ack, ApiClient, ApiError};

/// A product as listed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Units on hand. `None` when the backend does not track stock.
    #[serde(default)]
    pub stock_quantity: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    /// Stock at or below this count is flagged in listings.
    pub const LOW_STOCK: u32 = 10;

    /// Whether stock is tracked and running low.
    #[must_use]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity.is_some_and(|s| s < Self::LOW_STOCK)
    }
}

/// The backend returns either a bare list or `{ "products": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProductList {
    Bare(Vec<Product>),
    Wrapped {
        #[serde(default)]
        products: Vec<Product>,
    },
}

impl From<ProductList> for Vec<Product> {
    fn from(list: ProductList) -> Self {
        match list {
            ProductList::Bare(products) | ProductList::Wrapped { products } => products,
        }
    }
}

/// Image attached to a product form.
#[derive(Debug, Clone)]
pub struct ProductImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ProductImage {
    fn content_type(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            "gif" => "image/gif",
            _ => "application/octet-stream",
        }
    }
}

/// Create/update form for a product.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub stock_quantity: u32,
    pub image: Option<ProductImage>,
}

impl ProductForm {
    fn into_multipart(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("description", self.description)
            .text("price", self.price.amount().to_string())
            .text("category", self.category)
            .text("stock_quantity", self.stock_quantity.to_string());

        if let Some(image) = self.image {
            let mime = image.content_type();
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(mime)?;
            form = form.part("image", part);
        }

        Ok(form)
    }
}

/// Response to a product create.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSaved {
    #[serde(default, alias = "message")]
    pub msg: Option<String>,
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

impl ApiClient {
    /// All products visible to the caller (cashier terminal catalogue).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not parse.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        let list: ProductList = self.get_json("/products/").await?;
        Ok(list.into())
    }

    /// The calling vendor's own inventory.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body does not parse.
    #[instrument(skip(self))]
    pub async fn list_vendor_products(&self) -> Result<Vec<Product>, ApiError> {
        let list: ProductList = self.get_json("/products/vendor").await?;
        Ok(list.into())
    }

    /// Create a product. Sent as multipart so an image can be attached.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, form), fields(name = %form.name))]
    pub async fn create_product(&self, form: ProductForm) -> Result<ProductSaved, ApiError> {
        self.post_multipart("/products/", form.into_multipart()?)
            .await
    }

    /// Replace a product's fields (and optionally its image).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self, form))]
    pub async fn update_product(&self, id: ProductId, form: ProductForm) -> Result<Ack, ApiError> {
        self.put_multipart(&format!("/products/{id}"), form.into_multipart()?)
            .await
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<Ack, ApiError> {
        self.delete(&format!("/products/{id}")).await
    }
}

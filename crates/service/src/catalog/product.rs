use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ServiceError;

/// A catalog record as stored in the backing file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub thumbnail: String,
    pub code: String,
    pub stock: u64,
    pub status: bool,
    pub category: String,
}

impl Product {
    /// The creation rules, applied to a stored record.
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("thumbnail", &self.thumbnail),
            ("code", &self.code),
            ("category", &self.category),
        ] {
            non_blank(name, value)?;
        }
        positive_price(self.price)?;
        if self.stock == 0 {
            return Err(ServiceError::validation("stock must be a positive integer"));
        }
        Ok(())
    }
}

/// Creation candidate: everything except `id` and `status`, which the store assigns.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub thumbnail: String,
    pub code: String,
    pub stock: i64,
    pub category: String,
}

impl NewProduct {
    /// Extract a candidate from an untyped JSON body, naming the field that
    /// is missing or has the wrong type.
    pub fn from_json(value: &Value) -> Result<Self, ServiceError> {
        let obj = as_object(value)?;
        Ok(Self {
            title: text(required(obj, "title")?, "title")?,
            description: text(required(obj, "description")?, "description")?,
            price: price(required(obj, "price")?)?,
            thumbnail: text(required(obj, "thumbnail")?, "thumbnail")?,
            code: text(required(obj, "code")?, "code")?,
            stock: stock(required(obj, "stock")?)?,
            category: text(required(obj, "category")?, "category")?,
        })
    }

    /// Field rules: text non-blank, price a positive finite number, stock a positive integer.
    /// Code uniqueness is checked by the store.
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("thumbnail", &self.thumbnail),
            ("code", &self.code),
            ("category", &self.category),
        ] {
            non_blank(name, value)?;
        }
        positive_price(self.price)?;
        positive_stock(self.stock)?;
        Ok(())
    }

    pub(crate) fn into_product(self, id: u64) -> Result<Product, ServiceError> {
        Ok(Product {
            id,
            title: self.title,
            description: self.description,
            price: self.price,
            thumbnail: self.thumbnail,
            code: self.code,
            stock: positive_stock(self.stock)?,
            status: true,
            category: self.category,
        })
    }
}

/// Partial update. Identity fields (`id`, `code`) are not part of a patch.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl ProductPatch {
    /// Extract a patch from an untyped JSON body.
    ///
    /// Rejects `id`/`code` (immutable), unknown keys and `null` values.
    pub fn from_json(value: &Value) -> Result<Self, ServiceError> {
        let obj = as_object(value)?;
        let mut patch = Self::default();
        for (key, v) in obj {
            if v.is_null() {
                return Err(ServiceError::validation(format!("{key} must not be null")));
            }
            match key.as_str() {
                "id" | "code" => {
                    return Err(ServiceError::validation(format!("{key} cannot be changed")))
                }
                "title" => patch.title = Some(text(v, "title")?),
                "description" => patch.description = Some(text(v, "description")?),
                "price" => patch.price = Some(price(v)?),
                "thumbnail" => patch.thumbnail = Some(text(v, "thumbnail")?),
                "stock" => patch.stock = Some(stock(v)?),
                "category" => patch.category = Some(text(v, "category")?),
                "status" => {
                    patch.status = Some(
                        v.as_bool()
                            .ok_or_else(|| ServiceError::validation("status must be a boolean"))?,
                    )
                }
                other => return Err(ServiceError::validation(format!("unknown field: {other}"))),
            }
        }
        Ok(patch)
    }

    /// Supplied fields follow the same rules as creation.
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("thumbnail", &self.thumbnail),
            ("category", &self.category),
        ] {
            if let Some(value) = value {
                non_blank(name, value)?;
            }
        }
        if let Some(p) = self.price {
            positive_price(p)?;
        }
        if let Some(s) = self.stock {
            positive_stock(s)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge supplied fields onto `product`. Call `validate` first.
    pub(crate) fn apply(self, product: &mut Product) -> Result<(), ServiceError> {
        if let Some(v) = self.title { product.title = v; }
        if let Some(v) = self.description { product.description = v; }
        if let Some(v) = self.price { product.price = v; }
        if let Some(v) = self.thumbnail { product.thumbnail = v; }
        if let Some(v) = self.stock { product.stock = positive_stock(v)?; }
        if let Some(v) = self.category { product.category = v; }
        if let Some(v) = self.status { product.status = v; }
        Ok(())
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, ServiceError> {
    value
        .as_object()
        .ok_or_else(|| ServiceError::validation("body must be a JSON object"))
}

fn required<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ServiceError> {
    match obj.get(key) {
        Some(Value::Null) | None => Err(ServiceError::validation(format!("{key} is required"))),
        Some(v) => Ok(v),
    }
}

fn text(v: &Value, key: &str) -> Result<String, ServiceError> {
    v.as_str()
        .map(str::to_owned)
        .ok_or_else(|| ServiceError::validation(format!("{key} must be a string")))
}

fn price(v: &Value) -> Result<f64, ServiceError> {
    v.as_f64()
        .ok_or_else(|| ServiceError::validation("price must be a number"))
}

fn stock(v: &Value) -> Result<i64, ServiceError> {
    if let Some(n) = v.as_i64() {
        return Ok(n);
    }
    // 10.0 is an integer; 2.5 and "10" are not
    match v.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(ServiceError::validation("stock must be an integer")),
    }
}

fn non_blank(name: &str, value: &str) -> Result<(), ServiceError> {
    if value.trim().is_empty() {
        return Err(ServiceError::validation(format!("{name} must not be blank")));
    }
    Ok(())
}

fn positive_price(price: f64) -> Result<(), ServiceError> {
    if !(price.is_finite() && price > 0.0) {
        return Err(ServiceError::validation("price must be a positive number"));
    }
    Ok(())
}

fn positive_stock(stock: i64) -> Result<u64, ServiceError> {
    u64::try_from(stock)
        .ok()
        .filter(|s| *s > 0)
        .ok_or_else(|| ServiceError::validation("stock must be a positive integer"))
}

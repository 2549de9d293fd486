// src/models/form.rs

//! Inbound search form submitted by the presentation layer.

use serde::{Deserialize, Serialize};

/// Ordered key/value pairs of a submitted search form.
///
/// Unchecked checkboxes are simply absent, so adapters that require explicit
/// boolean flags fill them in with [`SearchForm::with_flag_defaults`].
/// Presentation-only field capping the images kept per listing.
pub const IMAGES_FIELD: &str = "images";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchForm {
    fields: Vec<(String, String)>,
}

impl SearchForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a form from pairs, dropping empty values.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut form = Self::new();
        for (key, value) in pairs {
            form.append(key, value);
        }
        form
    }

    /// Append a field. Empty values are ignored.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.fields.push((key.into(), value));
    }

    /// Set a field, replacing every previous value for the key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.fields.retain(|(k, _)| k != key);
        self.fields.push((key.to_string(), value.into()));
    }

    pub fn remove(&mut self, key: &str) {
        self.fields.retain(|(k, _)| k != key);
    }

    /// First value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Checkbox value: absent means false.
    pub fn flag(&self, key: &str) -> bool {
        matches!(
            self.get(key).map(|v| v.trim().to_lowercase()).as_deref(),
            Some("true" | "on" | "1" | "yes")
        )
    }

    /// Copy of this form with the `page` field set.
    pub fn with_page(&self, page: u32) -> Self {
        let mut form = self.clone();
        form.set("page", page.to_string());
        form
    }

    /// Copy of this form with `name=false` added for every absent flag.
    pub fn with_flag_defaults(&self, flags: &[&str]) -> Self {
        let mut form = self.clone();
        for flag in flags {
            if !form.has(flag) {
                form.fields.push((flag.to_string(), "false".to_string()));
            }
        }
        form
    }

    /// Copy of this form without `key`.
    pub fn without(&self, key: &str) -> Self {
        let mut form = self.clone();
        form.remove(key);
        form
    }

    /// Images to keep per listing, from the `images` field.
    ///
    /// `None` when the field is absent. A value with no leading digits
    /// counts as zero.
    pub fn image_limit(&self) -> Option<usize> {
        let raw = self.get(IMAGES_FIELD)?.trim();
        let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
        Some(digits.parse().unwrap_or(0))
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// URL-encoded query string of every field.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs())
            .finish()
    }
}

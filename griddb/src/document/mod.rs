// Documents - ordered, named collections of items used as rows and as schemas

use crate::error::{GridError, Result};
use crate::item::{DataType, Feature, Item};
use serde::{Deserialize, Serialize};

/// An ordered collection of uniquely named items.
///
/// A document with values is a row; a document carrying only type and feature
/// metadata is a schema (the `columns` of a grid).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    name: String,
    #[serde(default)]
    items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Document>,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Document {
            name: name.into(),
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add an item, replacing any existing item with the same name in place
    pub fn add(&mut self, item: Item) {
        match self.items.iter_mut().find(|i| i.name() == item.name()) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    /// Builder form of `add`
    pub fn with(mut self, item: Item) -> Self {
        self.add(item);
        self
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name() == name)
    }

    pub fn item_mut(&mut self, name: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.item(name).is_some()
    }

    /// First value of the named item
    pub fn value(&self, name: &str) -> Option<&str> {
        self.item(name).and_then(Item::value)
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let item = self
            .item_mut(name)
            .ok_or_else(|| GridError::UnknownField(name.to_string()))?;
        item.set_value(value);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.name() == name)?;
        Some(self.items.remove(pos))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(Item::name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items_with_feature<'a>(
        &'a self,
        feature: &'a Feature,
    ) -> impl Iterator<Item = &'a Item> {
        self.items
            .iter()
            .filter(move |i| i.is_feature_enabled(feature))
    }

    /// The item tagged as primary key, if exactly one is
    pub fn primary_key(&self) -> Option<&Item> {
        let mut keys = self.items_with_feature(&Feature::IsPrimary);
        match (keys.next(), keys.next()) {
            (Some(key), None) => Some(key),
            _ => None,
        }
    }

    /// Declared type of a field
    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.item(name).map(Item::data_type)
    }

    /// A copy of this schema with every value stripped, ready to be filled as a row
    pub fn new_row(&self) -> Document {
        Document {
            name: self.name.clone(),
            items: self.items.iter().map(Item::without_values).collect(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: Document) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[Document] {
        &self.children
    }
}

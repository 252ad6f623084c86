//! SELECT clause builder
//!
//! A [`SelectSet`] records which attributes to project and how each one is
//! aggregated. Entries keep their insertion order so that generated queries
//! are stable between runs.
//!
//! Two projection shapes are supported:
//!
//! - **raw**: every selected attribute, aggregated ones wrapped as
//!   `(AGG(?x) AS ?X)`
//! - **latest per address**: the four identity attributes, the maximum
//!   transaction date, and every other selected attribute sampled. Grouping by
//!   the identity attributes then collapses each address to one row.

use super::attribute::Attribute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    /// Projected as-is; must appear in GROUP BY.
    None,
    #[default]
    Sample,
    Max,
}

impl Aggregation {
    pub fn function(self) -> Option<&'static str> {
        match self {
            Aggregation::None => None,
            Aggregation::Sample => Some("SAMPLE"),
            Aggregation::Max => Some("MAX"),
        }
    }

    pub fn is_aggregated(self) -> bool {
        self != Aggregation::None
    }
}

/// `(AGG(?x) AS ?X)`
pub(crate) fn aggregate_term(function: &str, attribute: Attribute) -> String {
    format!(
        "({}({}) AS {})",
        function,
        attribute.variable(),
        attribute.aggregate_variable()
    )
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectSet {
    entries: Vec<(Attribute, Aggregation)>,
}

impl SelectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every attribute in `attributes` with the default aggregation.
    pub fn of(attributes: &[Attribute]) -> Self {
        let mut select = Self::new();
        for attribute in attributes {
            select.select(*attribute);
        }
        select
    }

    pub fn select(&mut self, attribute: Attribute) {
        self.select_with(attribute, Aggregation::default());
    }

    /// Select `attribute`, or change its aggregation in place if it is
    /// already selected.
    pub fn select_with(&mut self, attribute: Attribute, aggregation: Aggregation) {
        match self.entries.iter_mut().find(|(a, _)| *a == attribute) {
            Some(entry) => entry.1 = aggregation,
            None => self.entries.push((attribute, aggregation)),
        }
    }

    pub fn deselect(&mut self, attribute: Attribute) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(a, _)| *a != attribute);
        self.entries.len() != before
    }

    /// Add every catalog attribute not yet selected. Existing entries keep
    /// their aggregation.
    pub fn select_all(&mut self) {
        for attribute in Attribute::ALL {
            if !self.has(attribute) {
                self.select(attribute);
            }
        }
    }

    pub fn deselect_all(&mut self) {
        self.entries.clear();
    }

    /// Flip membership of `attribute`; returns whether it is now selected.
    pub fn toggle(&mut self, attribute: Attribute) -> bool {
        if self.deselect(attribute) {
            false
        } else {
            self.select(attribute);
            true
        }
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        self.entries.iter().any(|(a, _)| *a == attribute)
    }

    pub fn aggregation(&self, attribute: Attribute) -> Option<Aggregation> {
        self.entries
            .iter()
            .find(|(a, _)| *a == attribute)
            .map(|(_, aggregation)| *aggregation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Attribute, Aggregation)> + '_ {
        self.entries.iter().copied()
    }

    pub fn attributes(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.entries.iter().map(|(a, _)| *a)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attributes the latest-per-address projection samples on top of the
    /// identity columns.
    pub(crate) fn sampled_extras(&self) -> impl Iterator<Item = Attribute> + '_ {
        self.attributes().filter(|a| {
            !Attribute::IDENTITY.contains(a) && *a != Attribute::TransactionDate
        })
    }

    pub fn build_projection(&self, latest_per_address: bool) -> String {
        let terms: Vec<String> = if latest_per_address {
            Attribute::IDENTITY
                .iter()
                .map(|a| a.variable())
                .chain(std::iter::once(aggregate_term(
                    "MAX",
                    Attribute::TransactionDate,
                )))
                .chain(self.sampled_extras().map(|a| aggregate_term("SAMPLE", a)))
                .collect()
        } else {
            self.entries
                .iter()
                .map(|(attribute, aggregation)| match aggregation.function() {
                    Some(function) => aggregate_term(function, *attribute),
                    None => attribute.variable(),
                })
                .collect()
        };

        if terms.is_empty() {
            "SELECT".to_string()
        } else {
            format!("SELECT {}", terms.join(" "))
        }
    }
}

//! WHERE-clause constraints
//!
//! A [`ConstraintSet`] holds at most one equality constraint per attribute
//! (last write wins), an optional set of postcodes matched with OR semantics,
//! and an optional inclusive lower bound on the transaction date.
//!
//! Values are validated and canonicalised when they are set, so a constraint
//! that exists can always be rendered.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::attribute::{Attribute, ValueKind};
use super::errors::QueryBuildError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A postcode is well formed when its inward code is separated by a single
/// space four characters from the end, e.g. `BH9 2SL`.
pub fn is_valid_postcode(postcode: &str) -> bool {
    let chars: Vec<char> = postcode.chars().collect();
    chars.len() >= 7 && chars[chars.len() - 4] == ' '
}

/// One bound attribute value.
///
/// `value` is kept in its query form: address text upper-cased, enum values
/// as `namespace:local-name`, prices as whole numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityConstraint {
    attribute: Attribute,
    value: String,
}

impl EqualityConstraint {
    pub fn new(attribute: Attribute, raw: &str) -> Result<Self, QueryBuildError> {
        let value = canonicalize(attribute, raw.trim())?;
        Ok(Self { attribute, value })
    }

    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Caller-facing value. Enum values lose their namespace and get their
    /// underscores back.
    pub fn value(&self) -> String {
        match self.attribute.value_kind() {
            ValueKind::Enum(_) => match self.value.split_once(':') {
                Some((_, local)) => local.replace('-', "_"),
                None => self.value.clone(),
            },
            _ => self.value.clone(),
        }
    }

    /// Value rendered as a SPARQL term.
    pub fn literal(&self) -> String {
        match self.attribute.value_kind() {
            ValueKind::Text => quote(&self.value),
            ValueKind::Date => format!("{}^^xsd:date", quote(&self.value)),
            ValueKind::Integer | ValueKind::Boolean | ValueKind::Enum(_) => self.value.clone(),
        }
    }

    /// `<subject> <predicate> <literal>.`
    pub fn to_triple(&self) -> String {
        format!(
            "{} {} {}.",
            self.attribute.category().subject(),
            self.attribute.predicate(),
            self.literal()
        )
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn canonicalize(attribute: Attribute, raw: &str) -> Result<String, QueryBuildError> {
    match attribute.value_kind() {
        ValueKind::Text => {
            let value = raw.to_uppercase();
            if attribute == Attribute::Postcode && !is_valid_postcode(&value) {
                return Err(QueryBuildError::invalid(
                    attribute.name(),
                    raw,
                    "must contain a space in the correct position",
                ));
            }
            Ok(value)
        }
        ValueKind::Integer => match raw.parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(format!("{}", number.round() as i64)),
            _ => Err(QueryBuildError::invalid(attribute.name(), raw, "not a number")),
        },
        ValueKind::Boolean => match raw.to_lowercase().as_str() {
            "true" => Ok("true".to_string()),
            "false" => Ok("false".to_string()),
            _ => Err(QueryBuildError::invalid(
                attribute.name(),
                raw,
                "expected true or false",
            )),
        },
        ValueKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(|date| date.format(DATE_FORMAT).to_string())
            .map_err(|e| QueryBuildError::invalid(attribute.name(), raw, e.to_string())),
        ValueKind::Enum(domain) => {
            // Accept bare names, prefixed names and full IRIs
            let local = raw
                .rsplit(|c: char| c == '/' || c == ':' || c == '#')
                .next()
                .unwrap_or(raw);
            let local = local.replace('-', "_");
            if !domain.contains(&local) {
                return Err(QueryBuildError::invalid(
                    attribute.name(),
                    raw,
                    format!("expected one of {}", domain.values().join(", ")),
                ));
            }
            Ok(format!("{}:{}", domain.namespace(), local.replace('_', "-")))
        }
    }
}

/// Attribute-keyed equality constraints, iterated in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EqualityConstraints {
    constraints: BTreeMap<Attribute, EqualityConstraint>,
}

impl EqualityConstraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `attribute` to `value`, replacing any previous binding. An empty
    /// value clears the binding instead.
    pub fn set(&mut self, attribute: Attribute, value: &str) -> Result<(), QueryBuildError> {
        if value.trim().is_empty() {
            self.remove(attribute);
            return Ok(());
        }
        let constraint = EqualityConstraint::new(attribute, value)?;
        self.constraints.insert(attribute, constraint);
        Ok(())
    }

    /// Bind a field by its untyped name.
    pub fn set_named(&mut self, name: &str, value: &str) -> Result<(), QueryBuildError> {
        self.set(Attribute::from_name(name)?, value)
    }

    pub fn remove(&mut self, attribute: Attribute) -> bool {
        self.constraints.remove(&attribute).is_some()
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        self.constraints.contains_key(&attribute)
    }

    pub fn get(&self, attribute: Attribute) -> Option<String> {
        self.constraints.get(&attribute).map(EqualityConstraint::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EqualityConstraint> {
        self.constraints.values()
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Bind an integer-valued attribute to an already rounded number.
    pub(crate) fn set_integer(&mut self, attribute: Attribute, value: i64) {
        self.constraints.insert(
            attribute,
            EqualityConstraint {
                attribute,
                value: value.to_string(),
            },
        );
    }

    /// Insert address text without the postcode shape check. Used for
    /// postcode bucket keys, which are deliberately truncated.
    pub(crate) fn set_unchecked_text(&mut self, attribute: Attribute, value: &str) {
        self.constraints.insert(
            attribute,
            EqualityConstraint {
                attribute,
                value: value.to_uppercase(),
            },
        );
    }
}

/// Everything that ends up inside the `WHERE { ... }` block besides the
/// variable bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    equality: EqualityConstraints,
    postcodes: Vec<String>,
    min_date: Option<NaiveDate>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_equality(&mut self, attribute: Attribute, value: &str) -> Result<(), QueryBuildError> {
        self.equality.set(attribute, value)
    }

    pub fn remove_equality(&mut self, attribute: Attribute) -> bool {
        self.equality.remove(attribute)
    }

    pub fn has_equality(&self, attribute: Attribute) -> bool {
        self.equality.has(attribute)
    }

    pub fn get_equality(&self, attribute: Attribute) -> Option<String> {
        self.equality.get(attribute)
    }

    pub fn equality(&self) -> &EqualityConstraints {
        &self.equality
    }

    /// Restrict results to any of `postcodes`. Every entry must be a well
    /// formed postcode; duplicates are dropped, first occurrence wins.
    pub fn set_postcodes<I, S>(&mut self, postcodes: I) -> Result<(), QueryBuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted: Vec<String> = Vec::new();
        for postcode in postcodes {
            let raw = postcode.as_ref().trim();
            let normalized = raw.to_uppercase();
            if !is_valid_postcode(&normalized) {
                return Err(QueryBuildError::invalid(
                    Attribute::Postcode.name(),
                    raw,
                    "must contain a space in the correct position",
                ));
            }
            if !accepted.contains(&normalized) {
                accepted.push(normalized);
            }
        }
        self.postcodes = accepted;
        Ok(())
    }

    pub fn postcodes(&self) -> &[String] {
        &self.postcodes
    }

    /// Inclusive lower bound on the transaction date.
    pub fn set_min_date(&mut self, date: NaiveDate) {
        self.min_date = Some(date);
    }

    pub fn clear_min_date(&mut self) {
        self.min_date = None;
    }

    pub fn min_date(&self) -> Option<NaiveDate> {
        self.min_date
    }

    /// Attributes whose variables must be bound for the serialized
    /// constraints to be meaningful.
    pub fn referenced_attributes(&self) -> Vec<Attribute> {
        let mut referenced = Vec::new();
        if !self.postcodes.is_empty() {
            referenced.push(Attribute::Postcode);
        }
        if self.min_date.is_some() {
            referenced.push(Attribute::TransactionDate);
        }
        referenced
    }

    /// One line per equality constraint, then the postcode set and the date
    /// bound if present.
    pub fn serialize(&self) -> String {
        let mut lines: Vec<String> = self.equality.iter().map(|c| c.to_triple()).collect();

        if !self.postcodes.is_empty() {
            let values: Vec<String> = self.postcodes.iter().map(|p| quote(p)).collect();
            lines.push(format!(
                "VALUES {} {{ {} }}",
                Attribute::Postcode.variable(),
                values.join(" ")
            ));
        }

        if let Some(date) = self.min_date {
            lines.push(format!(
                "FILTER ({} >= \"{}\"^^xsd:date)",
                Attribute::TransactionDate.variable(),
                date.format(DATE_FORMAT)
            ));
        }

        lines.join("\n")
    }
}

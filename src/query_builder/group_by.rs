//! GROUP BY clause builder
//!
//! Every attribute projected without an aggregate has to be grouped on. The
//! group list is derived from a [`SelectSet`] rather than maintained by hand,
//! so the two clauses cannot drift apart.

use super::attribute::Attribute;
use super::select::SelectSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSet {
    attributes: Vec<Attribute>,
}

impl GroupSet {
    /// Non-aggregated attributes of `select`, in selection order.
    pub fn from_select(select: &SelectSet) -> Self {
        Self {
            attributes: select
                .iter()
                .filter(|(_, aggregation)| !aggregation.is_aggregated())
                .map(|(attribute, _)| attribute)
                .collect(),
        }
    }

    /// Grouping used by the latest-sale-per-address projection.
    pub fn latest_per_address() -> Self {
        Self {
            attributes: Attribute::IDENTITY.to_vec(),
        }
    }

    pub fn single(attribute: Attribute) -> Self {
        Self {
            attributes: vec![attribute],
        }
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// `GROUP BY ?a ?b`, or an empty string when nothing needs grouping.
    pub fn build_group_by(&self) -> String {
        if self.attributes.is_empty() {
            return String::new();
        }
        let variables: Vec<String> = self.attributes.iter().map(|a| a.variable()).collect();
        format!("GROUP BY {}", variables.join(" "))
    }
}

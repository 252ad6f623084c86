//! Query composition
//!
//! A [`Query`] is an immutable composition of a [`ConstraintSet`], a
//! [`SelectSet`] and an optional [`GroupSet`]. Serializing it produces one
//! SPARQL query string:
//!
//! ```text
//! <prologue>
//! SELECT ...
//! WHERE {
//!   ?transx lrppi:propertyAddress ?addr.
//!   <variable bindings>
//!   <constraints>
//! }
//! GROUP BY ...
//! ```
//!
//! The prologue comes from a [`QueryTemplate`] loaded once at startup and
//! shared read-only. Canned recipes for the common request shapes live at the
//! bottom of this module.

use std::collections::BTreeSet;
use std::path::Path;

use super::attribute::{Attribute, Category};
use super::constraint::ConstraintSet;
use super::errors::QueryBuildError;
use super::group_by::GroupSet;
use super::select::SelectSet;

/// Prefix declarations for the Land Registry linked-data store.
pub const DEFAULT_PROLOGUE: &str = "\
prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#>
prefix owl: <http://www.w3.org/2002/07/owl#>
prefix xsd: <http://www.w3.org/2001/XMLSchema#>
prefix sr: <http://data.ordnancesurvey.co.uk/ontology/spatialrelations/>
prefix ukhpi: <http://landregistry.data.gov.uk/def/ukhpi/>
prefix lrppi: <http://landregistry.data.gov.uk/def/ppi/>
prefix skos: <http://www.w3.org/2004/02/skos/core#>
prefix lrcommon: <http://landregistry.data.gov.uk/def/common/>
";

/// Links every transaction to the address it was recorded against.
const ADDRESS_LINK: &str = "?transx lrppi:propertyAddress ?addr.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTemplate {
    prologue: String,
}

impl QueryTemplate {
    pub fn new(prologue: impl Into<String>) -> Self {
        Self {
            prologue: prologue.into(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        std::fs::read_to_string(path).map(Self::new)
    }

    pub fn prologue(&self) -> &str {
        &self.prologue
    }
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_PROLOGUE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    #[default]
    Raw,
    /// Most recent transaction per address.
    LatestPerAddress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryShape {
    Select {
        constraints: ConstraintSet,
        select: SelectSet,
        group: Option<GroupSet>,
        mode: ProjectionMode,
    },
    AggregateByField {
        inner: Box<Query>,
        group_field: Attribute,
        source_field: String,
        output_field: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    shape: QueryShape,
}

impl Query {
    pub fn new(
        constraints: ConstraintSet,
        select: SelectSet,
        group: Option<GroupSet>,
        mode: ProjectionMode,
    ) -> Self {
        Self {
            shape: QueryShape::Select {
                constraints,
                select,
                group,
                mode,
            },
        }
    }

    /// Raw projection grouped on whatever `select` leaves unaggregated.
    pub fn raw(constraints: ConstraintSet, select: SelectSet) -> Self {
        let group = GroupSet::from_select(&select);
        Self::new(constraints, select, Some(group), ProjectionMode::Raw)
    }

    pub fn compose(&self, template: &QueryTemplate) -> String {
        format!("{}\n{}", template.prologue().trim_end(), self.render_body())
    }

    fn render_body(&self) -> String {
        match &self.shape {
            QueryShape::Select {
                constraints,
                select,
                group,
                mode,
            } => render_select(constraints, select, group.as_ref(), *mode),
            QueryShape::AggregateByField {
                inner,
                group_field,
                source_field,
                output_field,
            } => {
                let group = GroupSet::single(*group_field);
                format!(
                    "SELECT {} (AVG(?{}) AS ?{})\nWHERE {{\n  {{\n{}\n  }}\n}}\n{}",
                    group_field.variable(),
                    source_field,
                    output_field,
                    indent(&inner.render_body(), 4),
                    group.build_group_by()
                )
            }
        }
    }
}

/// Compose a single query string from its parts.
pub fn compose(
    template: &QueryTemplate,
    constraints: &ConstraintSet,
    select: &SelectSet,
    group: Option<&GroupSet>,
    latest_per_address: bool,
) -> String {
    let mode = if latest_per_address {
        ProjectionMode::LatestPerAddress
    } else {
        ProjectionMode::Raw
    };
    format!(
        "{}\n{}",
        template.prologue().trim_end(),
        render_select(constraints, select, group, mode)
    )
}

fn render_select(
    constraints: &ConstraintSet,
    select: &SelectSet,
    group: Option<&GroupSet>,
    mode: ProjectionMode,
) -> String {
    let latest = mode == ProjectionMode::LatestPerAddress;
    if select.is_empty() && !latest {
        log::warn!("Composing a query with an empty projection");
    }

    let mut bound: BTreeSet<Attribute> = select.attributes().collect();
    if latest {
        bound.extend(Attribute::IDENTITY);
        bound.insert(Attribute::TransactionDate);
    }
    if let Some(group) = group {
        bound.extend(group.attributes().iter().copied());
    }
    bound.extend(constraints.referenced_attributes());

    let mut lines = vec![ADDRESS_LINK.to_string()];
    lines.extend(bound.into_iter().map(binding_line));
    let serialized = constraints.serialize();
    if !serialized.is_empty() {
        lines.extend(serialized.lines().map(str::to_string));
    }

    let mut body = format!(
        "{}\nWHERE {{\n{}\n}}",
        select.build_projection(latest),
        indent(&lines.join("\n"), 2)
    );
    if let Some(group) = group {
        let group_by = group.build_group_by();
        if !group_by.is_empty() {
            body.push('\n');
            body.push_str(&group_by);
        }
    }
    body
}

/// Triple binding an attribute's variable to its subject.
fn binding_line(attribute: Attribute) -> String {
    let triple = format!(
        "{} {} {}.",
        attribute.category().subject(),
        attribute.predicate(),
        attribute.variable()
    );
    if attribute.category() == Category::Address && attribute.is_sparse() {
        format!("OPTIONAL {{ {} }}", triple)
    } else {
        triple
    }
}

fn indent(text: &str, width: usize) -> String {
    let pad = " ".repeat(width);
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Recipes
// ---------------------------------------------------------------------------

/// Latest sale per address matching `constraints`, projecting `extra`
/// attributes on top of the identity columns.
pub fn latest_sales_only(constraints: ConstraintSet, extra: &[Attribute]) -> Query {
    Query::new(
        constraints,
        SelectSet::of(extra),
        Some(GroupSet::latest_per_address()),
        ProjectionMode::LatestPerAddress,
    )
}

/// Wrap `query` as a subquery and average `source_field` per `group_field`.
///
/// `source_field` must be a variable projected by `query`; `output_field` is
/// the name the average is exposed under.
pub fn aggregate_by_field(
    query: Query,
    group_field: Attribute,
    source_field: &str,
    output_field: &str,
) -> Query {
    Query {
        shape: QueryShape::AggregateByField {
            inner: Box::new(query),
            group_field,
            source_field: source_field.trim_start_matches('?').to_string(),
            output_field: output_field.trim_start_matches('?').to_string(),
        },
    }
}

/// Average latest-sale price for each of `postcodes`.
///
/// Rows come back as `postcode` + `pricePaid`, so they decode into records
/// like any other result.
pub fn average_price_for_postcodes<S: AsRef<str>>(
    postcodes: &[S],
) -> Result<Query, QueryBuildError> {
    let mut constraints = ConstraintSet::new();
    constraints.set_postcodes(postcodes)?;
    let latest = latest_sales_only(constraints, &[Attribute::PricePaid]);
    Ok(aggregate_by_field(
        latest,
        Attribute::Postcode,
        &Attribute::PricePaid.aggregate_variable(),
        Attribute::PricePaid.name(),
    ))
}

//! Query parsing and explanation seams.

use crate::catalog::esg;
use crate::error::{PortfolioError, PortfolioResult};
use crate::filter::{FilterSpec, Predicate};
use crate::optimizer::SelectionResult;

use super::types::PortfolioSummary;

/// Turns free text into a [`FilterSpec`].
pub trait QueryParser: Send + Sync {
    fn parse(&self, text: &str) -> PortfolioResult<FilterSpec>;
}

/// Parses `;`-separated `attribute <op> value` clauses.
///
/// Operators are `>=`, `<=`, `>`, `<`, `==` and `=` (a synonym of `==`).
///
/// # Examples
///
/// ```
/// use u_portfolio::filter::{Comparison, Predicate};
/// use u_portfolio::pipeline::{ClauseParser, QueryParser};
///
/// let spec = ClauseParser.parse("Sector = Energy; Expected_ROI_Percent >= 8").unwrap();
/// assert_eq!(spec.get("Sector"), Some(&Predicate::equals("Energy")));
/// assert_eq!(
///     spec.get("Expected_ROI_Percent"),
///     Some(&Predicate::threshold(Comparison::Ge, 8.0))
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseParser;

impl QueryParser for ClauseParser {
    fn parse(&self, text: &str) -> PortfolioResult<FilterSpec> {
        let mut spec = FilterSpec::new();
        for clause in text.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let Some(at) = clause.find(['>', '<', '=']) else {
                return Err(PortfolioError::QueryParse(format!(
                    "'{clause}' has no comparison operator"
                )));
            };
            let attribute = clause[..at].trim();
            if attribute.is_empty() {
                return Err(PortfolioError::QueryParse(format!("'{clause}' names no attribute")));
            }
            let rest = &clause[at..];
            let expr = match rest.strip_prefix('=') {
                Some(tail) if !tail.starts_with('=') => format!("=={tail}"),
                _ => rest.to_string(),
            };
            spec.insert(attribute, Predicate::parse(&expr)?);
        }
        Ok(spec)
    }
}

/// Produces the human-readable summary of a selection.
pub trait SelectionExplainer: Send + Sync {
    fn explain(&self, selection: &SelectionResult, filters: &FilterSpec) -> String;
}

/// Fixed-template explanation: count, total cost, average default score,
/// applied filters. Catalogs carrying the ESG impact columns also get an
/// expected-impact sentence.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl SelectionExplainer for TemplateExplainer {
    fn explain(&self, selection: &SelectionResult, filters: &FilterSpec) -> String {
        if selection.is_empty() {
            return "No projects were selected based on the given criteria.".to_string();
        }
        let summary = PortfolioSummary::from_selection(selection);
        let schema = selection.schema();

        let mut text = format!(
            "Selected {} project{} with total cost of {} ({:.1}% of budget).",
            summary.total_projects,
            if summary.total_projects == 1 { "" } else { "s" },
            group_thousands(summary.total_cost),
            selection.diagnostics.budget_utilization * 100.0
        );
        if let Some(avg) = summary.mean_default_score {
            text.push_str(&format!(
                " Average {}: {avg:.1}.",
                schema.name(schema.default_score())
            ));
        }
        text.push_str(&format!(" Average composite score: {:.1}.", summary.mean_score));
        if let Some(impact) = impact_sentence(&summary) {
            text.push(' ');
            text.push_str(&impact);
        }
        if !filters.is_empty() {
            let clauses: Vec<String> = filters
                .iter()
                .map(|(name, p)| format!("{name} {}", describe(p)))
                .collect();
            text.push_str(&format!(" Filters: {}.", clauses.join(", ")));
        }
        text
    }
}

fn impact_sentence(summary: &PortfolioSummary) -> Option<String> {
    let co2 = summary.numeric_totals.get(esg::CO2_REDUCTION_TONNES_ANNUAL)?;
    let jobs = summary.numeric_totals.get(esg::JOBS_CREATED_TOTAL)?;
    let roi = summary.numeric_means.get(esg::EXPECTED_ROI_PERCENT)?;
    let beneficiaries = summary.numeric_totals.get(esg::BENEFICIARIES_DIRECT)?;
    Some(format!(
        "Expected impact: {} tonnes CO2 reduction annually, {} jobs created, {roi:.1}% average ROI, {} direct beneficiaries.",
        group_thousands(*co2),
        group_thousands(*jobs),
        group_thousands(*beneficiaries)
    ))
}

fn describe(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Threshold { op, value } => format!("{op} {value}"),
        Predicate::Equals(v) => format!("= {v}"),
        Predicate::OneOf(values) => {
            let list: Vec<String> = values.iter().map(ToString::to_string).collect();
            format!("in [{}]", list.join(", "))
        }
    }
}

/// Rounds to a whole number and inserts `,` every three digits.
fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(rounded.len() + rounded.len() / 3 + 1);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0.0 && rounded != "0" {
        out.insert(0, '-');
    }
    out
}

//! Standard ESG project dataset contract.
//!
//! Dataset providers that publish ESG project catalogs use this schema:
//! `Total_Investment_USD` is the cost and `Overall_ESG_Score` the fallback
//! score. The default weights and constraint rules here are what the
//! pipeline applies when a request does not supply its own.

use super::schema::Schema;
use super::value::RiskLevel;
use crate::constraints::{ConstraintConfig, DiversityRule, RiskCapRule};
use crate::error::PortfolioResult;
use crate::scoring::WeightMap;

pub const PROJECT_TYPE: &str = "Project_Type";
pub const SECTOR: &str = "Sector";
pub const REGION: &str = "Region";
pub const COUNTRY: &str = "Country";
pub const STATUS: &str = "Status";
pub const PRIMARY_SDG: &str = "Primary_SDG";
pub const START_DATE: &str = "Start_Date";
pub const END_DATE: &str = "End_Date";
pub const TOTAL_INVESTMENT_USD: &str = "Total_Investment_USD";
pub const EXPECTED_ROI_PERCENT: &str = "Expected_ROI_Percent";
pub const PAYBACK_PERIOD_YEARS: &str = "Payback_Period_Years";
pub const CO2_REDUCTION_TONNES_ANNUAL: &str = "CO2_Reduction_Tonnes_Annual";
pub const RENEWABLE_ENERGY_CAPACITY_MW: &str = "Renewable_Energy_Capacity_MW";
pub const WATER_SAVINGS_M3_ANNUAL: &str = "Water_Savings_m3_Annual";
pub const ENVIRONMENTAL_SCORE: &str = "Environmental_Score";
pub const JOBS_CREATED_TOTAL: &str = "Jobs_Created_Total";
pub const BENEFICIARIES_DIRECT: &str = "Beneficiaries_Direct";
pub const SOCIAL_SCORE: &str = "Social_Score";
pub const GOVERNANCE_SCORE: &str = "Governance_Score";
pub const OVERALL_ESG_SCORE: &str = "Overall_ESG_Score";
pub const IMPACT_POTENTIAL_SCORE: &str = "Impact_Potential_Score";
pub const INNOVATION_SCORE: &str = "Innovation_Score";
pub const SCALABILITY_SCORE: &str = "Scalability_Score";
pub const LONG_TERM_VIABILITY_SCORE: &str = "Long_Term_Viability_Score";
pub const ENVIRONMENTAL_RISK_LEVEL: &str = "Environmental_Risk_Level";
pub const SOCIAL_RISK_LEVEL: &str = "Social_Risk_Level";
pub const GOVERNANCE_RISK_LEVEL: &str = "Governance_Risk_Level";
pub const FINANCIAL_RISK_LEVEL: &str = "Financial_Risk_Level";

/// Builds the ESG schema.
pub fn schema() -> PortfolioResult<Schema> {
    Schema::builder()
        .categorical(PROJECT_TYPE)
        .categorical(SECTOR)
        .categorical(REGION)
        .categorical(COUNTRY)
        .categorical(STATUS)
        .categorical(PRIMARY_SDG)
        .date(START_DATE)
        .date(END_DATE)
        .numeric(TOTAL_INVESTMENT_USD)
        .numeric(EXPECTED_ROI_PERCENT)
        .numeric(PAYBACK_PERIOD_YEARS)
        .numeric(CO2_REDUCTION_TONNES_ANNUAL)
        .numeric(RENEWABLE_ENERGY_CAPACITY_MW)
        .numeric(WATER_SAVINGS_M3_ANNUAL)
        .numeric(ENVIRONMENTAL_SCORE)
        .numeric(JOBS_CREATED_TOTAL)
        .numeric(BENEFICIARIES_DIRECT)
        .numeric(SOCIAL_SCORE)
        .numeric(GOVERNANCE_SCORE)
        .numeric(OVERALL_ESG_SCORE)
        .numeric(IMPACT_POTENTIAL_SCORE)
        .numeric(INNOVATION_SCORE)
        .numeric(SCALABILITY_SCORE)
        .numeric(LONG_TERM_VIABILITY_SCORE)
        .risk(ENVIRONMENTAL_RISK_LEVEL)
        .risk(SOCIAL_RISK_LEVEL)
        .risk(GOVERNANCE_RISK_LEVEL)
        .risk(FINANCIAL_RISK_LEVEL)
        .cost_attribute(TOTAL_INVESTMENT_USD)
        .default_score_attribute(OVERALL_ESG_SCORE)
        .build()
}

/// Default scoring weights (sum to 1).
pub fn default_weights() -> WeightMap {
    WeightMap::new()
        .with(OVERALL_ESG_SCORE, 0.20)
        .with(IMPACT_POTENTIAL_SCORE, 0.15)
        .with(CO2_REDUCTION_TONNES_ANNUAL, 0.12)
        .with(JOBS_CREATED_TOTAL, 0.10)
        .with(EXPECTED_ROI_PERCENT, 0.08)
        .with(BENEFICIARIES_DIRECT, 0.08)
        .with(INNOVATION_SCORE, 0.06)
        .with(SCALABILITY_SCORE, 0.06)
        .with(LONG_TERM_VIABILITY_SCORE, 0.05)
        .with(SOCIAL_SCORE, 0.05)
        .with(GOVERNANCE_SCORE, 0.05)
}

/// Default post-processing rules: at least two sectors, at most two
/// high financial-risk projects.
pub fn default_constraints() -> ConstraintConfig {
    ConstraintConfig::default()
        .with_diversity(DiversityRule::new(SECTOR, 2))
        .with_risk_cap(RiskCapRule::new(FINANCIAL_RISK_LEVEL, 2).with_unfavorable(RiskLevel::High))
}

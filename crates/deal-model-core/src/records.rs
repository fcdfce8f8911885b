//! Persisted analysis shape and a store interface.
//!
//! Records are keyed by `(deal_id, analysis_type)` and the most recent save
//! wins. The model itself never touches a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::DealModelError;
use crate::DealModelResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    Dscr,
    BusinessLoan,
    Acquisition,
    Valuation,
    CreAcquisition,
    CreLoanSizer,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dscr => "dscr",
            Self::BusinessLoan => "business-loan",
            Self::Acquisition => "acquisition",
            Self::Valuation => "valuation",
            Self::CreAcquisition => "cre-acquisition",
            Self::CreLoanSizer => "cre-loan-sizer",
        }
    }

    pub fn default_name(&self) -> &'static str {
        match self {
            Self::Dscr => "DSCR Analysis",
            Self::BusinessLoan => "Business Loan Analysis",
            Self::Acquisition => "Acquisition Analysis",
            Self::Valuation => "Valuation Analysis",
            Self::CreAcquisition => "CRE Acquisition Analysis",
            Self::CreLoanSizer => "CRE Loan Sizer Analysis",
        }
    }
}

impl std::fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisType {
    type Err = DealModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dscr" => Ok(Self::Dscr),
            "business-loan" => Ok(Self::BusinessLoan),
            "acquisition" => Ok(Self::Acquisition),
            "valuation" => Ok(Self::Valuation),
            "cre-acquisition" => Ok(Self::CreAcquisition),
            "cre-loan-sizer" => Ok(Self::CreLoanSizer),
            other => Err(DealModelError::InvalidInput {
                field: "analysis_type".into(),
                reason: format!("Unknown analysis type '{other}'"),
            }),
        }
    }
}

/// Inputs and outputs of one calculation, as a caller would persist them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub deal_id: String,
    pub analysis_type: AnalysisType,
    pub name: String,
    pub inputs: serde_json::Value,
    pub outputs: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(
        deal_id: impl Into<String>,
        analysis_type: AnalysisType,
        inputs: &impl Serialize,
        outputs: &impl Serialize,
        at: DateTime<Utc>,
    ) -> DealModelResult<Self> {
        Ok(Self {
            deal_id: deal_id.into(),
            analysis_type,
            name: analysis_type.default_name().to_string(),
            inputs: serde_json::to_value(inputs)?,
            outputs: serde_json::to_value(outputs)?,
            created_at: at,
            updated_at: at,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

pub trait AnalysisStore {
    /// Store `record`. Returns `false` when a newer record already exists.
    fn save(&mut self, record: AnalysisRecord) -> DealModelResult<bool>;

    fn load(&self, deal_id: &str, analysis_type: AnalysisType) -> DealModelResult<AnalysisRecord>;

    /// All records for a deal, most recently updated first.
    fn list(&self, deal_id: &str) -> Vec<AnalysisRecord>;

    fn delete(&mut self, deal_id: &str, analysis_type: AnalysisType) -> DealModelResult<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryAnalysisStore {
    records: HashMap<(String, AnalysisType), AnalysisRecord>,
}

impl InMemoryAnalysisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn not_found(deal_id: &str, analysis_type: AnalysisType) -> DealModelError {
    DealModelError::RecordNotFound {
        deal_id: deal_id.to_string(),
        analysis_type: analysis_type.to_string(),
    }
}

impl AnalysisStore for InMemoryAnalysisStore {
    fn save(&mut self, mut record: AnalysisRecord) -> DealModelResult<bool> {
        let key = (record.deal_id.clone(), record.analysis_type);
        if let Some(existing) = self.records.get(&key) {
            if existing.updated_at > record.updated_at {
                debug!(deal_id = %record.deal_id, kind = %record.analysis_type, "stale save ignored");
                return Ok(false);
            }
            record.created_at = existing.created_at;
        }
        self.records.insert(key, record);
        Ok(true)
    }

    fn load(&self, deal_id: &str, analysis_type: AnalysisType) -> DealModelResult<AnalysisRecord> {
        self.records
            .get(&(deal_id.to_string(), analysis_type))
            .cloned()
            .ok_or_else(|| not_found(deal_id, analysis_type))
    }

    fn list(&self, deal_id: &str) -> Vec<AnalysisRecord> {
        let mut out: Vec<AnalysisRecord> = self
            .records
            .values()
            .filter(|r| r.deal_id == deal_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        out
    }

    fn delete(&mut self, deal_id: &str, analysis_type: AnalysisType) -> DealModelResult<()> {
        self.records
            .remove(&(deal_id.to_string(), analysis_type))
            .map(|_| ())
            .ok_or_else(|| not_found(deal_id, analysis_type))
    }
}

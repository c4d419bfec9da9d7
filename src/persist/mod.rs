//! Persistence of completed analysis runs
//!
//! The pipeline records one write-once record per completed run through the
//! [`AnalysisSink`] trait; a database-backed sink lives with the surrounding
//! service, the in-memory sink here serves tests and the CLI.

use crate::pipeline::{AdviceDependencies, NutritionAdvice, NutritionFacts};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Durable record of one completed analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<NutritionFacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<AdviceDependencies>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<NutritionAdvice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Write-once sink for analysis records
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn record(&self, record: AnalysisRecord) -> anyhow::Result<()>;
}

/// In-memory sink collecting records for inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<AnalysisRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AnalysisRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AnalysisSink for MemorySink {
    async fn record(&self, record: AnalysisRecord) -> anyhow::Result<()> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{month::YearMonth, time_control::TimeClass};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub month: YearMonth,
    /// 1-based position of the game within its month.
    pub index: usize,
    pub label: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTally {
    pub found: usize,
    pub imported: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthReport {
    pub month: YearMonth,
    pub found: usize,
    pub matched: usize,
    pub imported: usize,
    pub failures: Vec<ImportFailure>,
    pub per_class: BTreeMap<TimeClass, ClassTally>,
}

impl MonthReport {
    pub fn new(month: YearMonth) -> Self {
        Self {
            month,
            found: 0,
            matched: 0,
            imported: 0,
            failures: Vec::new(),
            per_class: BTreeMap::new(),
        }
    }

    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{}: {} games found, {} imported",
            self.month, self.found, self.imported
        );
        if !self.failures.is_empty() {
            line.push_str(&format!(", {} failed", self.failures.len()));
        }
        line
    }

    pub fn class_lines(&self) -> Vec<String> {
        self.per_class
            .iter()
            .map(|(class, tally)| {
                format!("  {class}: {} found, {} imported", tally.found, tally.imported)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub months: Vec<MonthReport>,
}

impl RunReport {
    pub fn found(&self) -> usize {
        self.months.iter().map(|m| m.found).sum()
    }

    pub fn imported(&self) -> usize {
        self.months.iter().map(|m| m.imported).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ImportFailure> {
        self.months.iter().flat_map(|m| m.failures.iter())
    }

    pub fn summary_line(&self) -> String {
        let failed = self.failures().count();
        let mut line = format!(
            "{} month(s): {} games found, {} imported",
            self.months.len(),
            self.found(),
            self.imported()
        );
        if failed > 0 {
            line.push_str(&format!(", {failed} failed"));
        }
        line
    }
}

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::collect::platform::PaletteEntry;
use crate::commons::basic_functions::{leaf_label, normalize_color};
use crate::error::{CorineError, CorineResult};

/// Raw legend properties of a classification band, as three parallel lists
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegendMetadata {
    /// Hierarchical names, levels separated by `"; "`
    pub names: Vec<String>,
    /// Class values, as text
    pub values: Vec<String>,
    /// Colours, bare hex or CSS
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub code: i64,
    pub name: String,
    pub color: String,
}

/// Ordered class legend with unique codes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClassificationLegend {
    entries: Vec<LegendEntry>,
}

/// Legend restricted to the classes seen in a region
pub type FilteredLegend = ClassificationLegend;

impl ClassificationLegend {
    pub fn new(entries: Vec<LegendEntry>) -> CorineResult<Self> {
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.code) {
                return Err(CorineError::MalformedMetadata(format!(
                    "class code {} appears more than once",
                    entry.code
                )));
            }
        }
        Ok(ClassificationLegend { entries })
    }

    pub fn entries(&self) -> &[LegendEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Codes in legend order
    pub fn codes(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|e| e.code)
    }

    pub fn get(&self, code: i64) -> Option<&LegendEntry> {
        self.entries.iter().find(|e| e.code == code)
    }

    pub fn contains(&self, code: i64) -> bool {
        self.get(code).is_some()
    }

    pub fn code_to_name(&self) -> HashMap<i64, String> {
        self.entries
            .iter()
            .map(|e| (e.code, e.name.clone()))
            .collect()
    }

    pub fn code_to_color(&self) -> HashMap<i64, String> {
        self.entries
            .iter()
            .map(|e| (e.code, e.color.clone()))
            .collect()
    }

    /// `code -> color` pairs for tile rendering
    pub fn palette(&self) -> Vec<PaletteEntry> {
        self.entries
            .iter()
            .map(|e| PaletteEntry {
                code: e.code,
                color: e.color.clone(),
            })
            .collect()
    }

    /// Entries whose code is in `observed`, in legend order
    pub fn filter<I>(&self, observed: I) -> FilteredLegend
    where
        I: IntoIterator<Item = i64>,
    {
        let observed: HashSet<i64> = observed.into_iter().collect();
        ClassificationLegend {
            entries: self
                .entries
                .iter()
                .filter(|e| observed.contains(&e.code))
                .cloned()
                .collect(),
        }
    }
}

/// Build the legend from the three parallel metadata lists.
///
/// Names keep their leaf segment only, values must parse as integers, bare hex colours
/// get a `#`. Any inconsistency fails the whole resolution.
pub fn resolve_legend(metadata: &LegendMetadata) -> CorineResult<ClassificationLegend> {
    let n = metadata.values.len();
    if metadata.names.len() != n || metadata.palette.len() != n {
        return Err(CorineError::MalformedMetadata(format!(
            "legend lists differ in length: {} names, {} values, {} colours",
            metadata.names.len(),
            n,
            metadata.palette.len()
        )));
    }

    let mut entries = Vec::with_capacity(n);
    for i in 0..n {
        let raw = metadata.values[i].trim();
        let code: i64 = raw.parse().map_err(|_| {
            CorineError::MalformedMetadata(format!("class value {:?} at index {} is not an integer", raw, i))
        })?;
        entries.push(LegendEntry {
            code,
            name: leaf_label(&metadata.names[i]).to_string(),
            color: normalize_color(&metadata.palette[i]),
        });
    }

    let legend = ClassificationLegend::new(entries)?;
    log::debug!("Resolved legend with {} classes", legend.len());
    Ok(legend)
}

/// Restrict `legend` to `observed_codes`, keeping legend order
pub fn filter_legend<I>(legend: &ClassificationLegend, observed_codes: I) -> FilteredLegend
where
    I: IntoIterator<Item = i64>,
{
    legend.filter(observed_codes)
}

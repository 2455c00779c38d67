/// Search and ordering for alias listings.
use alias_manager_config::SortColumn;
use regex::Regex;

use crate::error::StoreError;
use crate::model::AliasRecord;

/// Which aliases a listing shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasFilter {
    /// Text looked for in name, command and description. Empty matches all.
    pub query: String,
    /// Exact section to restrict to.
    pub section: Option<String>,
    pub use_regex: bool,
    pub case_sensitive: bool,
}

/// A filter ready to test records.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    pattern: Option<Regex>,
    section: Option<String>,
}

impl AliasFilter {
    /// Builds the matcher.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPattern` if `use_regex` is set and the
    /// query is not a valid regular expression.
    pub fn compile(&self) -> Result<CompiledFilter, StoreError> {
        let pattern = if self.query.is_empty() {
            None
        } else {
            let source = if self.use_regex {
                self.query.clone()
            } else {
                regex::escape(&self.query)
            };
            let regex = if self.case_sensitive {
                Regex::new(&source)
            } else {
                Regex::new(&format!("(?i){source}"))
            };
            Some(regex?)
        };
        Ok(CompiledFilter {
            pattern,
            section: self.section.clone(),
        })
    }

    /// Returns the records that pass the filter, in their original order.
    pub fn apply<'a>(&self, records: &'a [AliasRecord]) -> Result<Vec<&'a AliasRecord>, StoreError> {
        let compiled = self.compile()?;
        Ok(records.iter().filter(|r| compiled.matches(r)).collect())
    }
}

impl CompiledFilter {
    pub fn matches(&self, record: &AliasRecord) -> bool {
        if let Some(section) = &self.section {
            if record.section != *section {
                return false;
            }
        }
        match &self.pattern {
            Some(re) => {
                re.is_match(&record.name)
                    || re.is_match(&record.command)
                    || re.is_match(&record.description)
            }
            None => true,
        }
    }
}

fn column_value(record: &AliasRecord, column: SortColumn) -> &str {
    match column {
        SortColumn::Name => &record.name,
        SortColumn::Command => &record.command,
        SortColumn::Section => &record.section,
        SortColumn::Description => &record.description,
    }
}

/// Sorts by the lowercase value of `column`; ties fall back to the name.
pub fn sort_aliases(records: &mut [&AliasRecord], column: SortColumn, ascending: bool) {
    records.sort_by(|a, b| {
        let ord = column_value(a, column)
            .to_lowercase()
            .cmp(&column_value(b, column).to_lowercase())
            .then_with(|| a.name.cmp(&b.name));
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
}

// src/wbs.rs

//! WBS codes: dot-separated ordinal paths such as `"2.1.2"`.
//!
//! A code is stored as its numeric segments, so ordering is segment-wise
//! numeric (`1.9 < 1.10`) and a parent always sorts before its children.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::StructuralError;

static WBS_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*$").expect("static WBS regex is valid")
});

/// Level from which tasks are work packages and may carry resourcing.
pub const WORK_PACKAGE_LEVEL: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WbsCode(Vec<u32>);

impl WbsCode {
    pub fn parse(s: &str) -> Result<Self, StructuralError> {
        let trimmed = s.trim();
        if !WBS_CODE_RE.is_match(trimmed) {
            return Err(StructuralError::InvalidWbsCode(s.to_string()));
        }

        trimmed
            .split('.')
            .map(|seg| seg.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(WbsCode)
            .map_err(|_| StructuralError::InvalidWbsCode(s.to_string()))
    }

    /// Number of dots in the code: `"1"` is level 0, `"1.2.3"` is level 2.
    pub fn level(&self) -> u32 {
        (self.0.len() - 1) as u32
    }

    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Code of the enclosing WBS element, or `None` for a root code.
    pub fn parent(&self) -> Option<WbsCode> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(WbsCode(self.0[..self.0.len() - 1].to_vec()))
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_strict_prefix_of(&self, other: &WbsCode) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// True if `self` is exactly one segment below `parent`.
    pub fn is_child_of(&self, parent: &WbsCode) -> bool {
        self.0.len() == parent.0.len() + 1 && parent.is_strict_prefix_of(self)
    }

    pub fn is_work_package(&self) -> bool {
        self.level() >= WORK_PACKAGE_LEVEL
    }
}

impl fmt::Display for WbsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for WbsCode {
    type Err = StructuralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WbsCode::parse(s)
    }
}

impl TryFrom<String> for WbsCode {
    type Error = StructuralError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        WbsCode::parse(&s)
    }
}

impl From<WbsCode> for String {
    fn from(code: WbsCode) -> Self {
        code.to_string()
    }
}

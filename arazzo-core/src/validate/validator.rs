use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::Diagnostics;
use crate::types::{ArazzoDocument, Components};

pub(crate) static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("valid"));
pub(crate) static MAP_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9\.\-_]+$").expect("valid"));

pub(crate) struct Validator<'d> {
    out: &'d mut Diagnostics,
    pub(crate) components: Option<&'d Components>,
}

impl<'d> Validator<'d> {
    pub(crate) fn new(out: &'d mut Diagnostics, doc: &'d ArazzoDocument) -> Self {
        Self {
            out,
            components: doc.components.as_ref(),
        }
    }

    pub(crate) fn push(&mut self, location: &str, key: &str, message: impl Into<String>) {
        self.out.invalid(location, key, message);
    }

    pub(crate) fn repeated(&mut self, location: &str, key: &str) {
        self.out.repeated(location, key);
    }

    pub(crate) fn warn(&mut self, location: &str, key: &str, message: impl Into<String>) {
        self.out.warning(location, key, message);
    }

    pub(crate) fn validate_spec_version(&mut self, version: &str) {
        // 1.0.0 and 1.0.1 share a feature set; only major.minor is enforced.
        let parts: Vec<&str> = version.split('.').collect();
        if parts.len() < 2 {
            self.push("$", "arazzo", "must be a semver-like string (major.minor[.patch])");
            return;
        }
        if parts[0] != "1" || parts[1] != "0" {
            self.push("$", "arazzo", "only Arazzo 1.0.x is supported");
        }
    }
}

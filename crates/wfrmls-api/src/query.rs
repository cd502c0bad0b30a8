//! OData query-parameter building and filter composition.
//!
//! Every resource client funnels through [`ODataQuery::to_params`], so the
//! `$top` cap, list joining and `$count` serialisation are enforced here once.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

/// Largest page the API will serve; larger `$top` values are clamped.
pub const MAX_TOP: u32 = 200;

// ── Field lists ─────────────────────────────────────────────────────

/// A `$select` / `$expand` value: either a pre-joined comma string or a
/// sequence of field names joined in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldList(String);

impl FieldList {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn join<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = fields
            .into_iter()
            .map(|f| f.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join(",");
        Self(joined)
    }
}

impl From<&str> for FieldList {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for FieldList {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<Vec<String>> for FieldList {
    fn from(v: Vec<String>) -> Self {
        Self::join(v)
    }
}

impl From<Vec<&str>> for FieldList {
    fn from(v: Vec<&str>) -> Self {
        Self::join(v)
    }
}

impl From<&[&str]> for FieldList {
    fn from(v: &[&str]) -> Self {
        Self::join(v)
    }
}

impl<const N: usize> From<[&str; N]> for FieldList {
    fn from(v: [&str; N]) -> Self {
        Self::join(v)
    }
}

impl fmt::Display for FieldList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Query ───────────────────────────────────────────────────────────

/// Optional OData system query options for a list request.
///
/// ```
/// use wfrmls_api::ODataQuery;
///
/// let q = ODataQuery::new().top(500).select(["ListingKey", "ListPrice"]);
/// assert_eq!(
///     q.to_params(),
///     vec![("$top", "200".to_owned()), ("$select", "ListingKey,ListPrice".to_owned())]
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    pub(crate) top: Option<u32>,
    pub(crate) skip: Option<u32>,
    pub(crate) filter: Option<String>,
    pub(crate) select: Option<FieldList>,
    pub(crate) orderby: Option<String>,
    pub(crate) expand: Option<FieldList>,
    pub(crate) count: Option<bool>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$top`, clamped to [`MAX_TOP`].
    pub fn top(mut self, n: u32) -> Self {
        self.top = Some(n.min(MAX_TOP));
        self
    }

    pub fn skip(mut self, n: u32) -> Self {
        self.skip = Some(n);
        self
    }

    /// Caller-supplied `$filter` expression, passed through untouched.
    pub fn filter(mut self, expr: impl Into<String>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    pub fn select(mut self, fields: impl Into<FieldList>) -> Self {
        self.select = Some(fields.into());
        self
    }

    pub fn orderby(mut self, expr: impl Into<String>) -> Self {
        self.orderby = Some(expr.into());
        self
    }

    pub fn expand(mut self, fields: impl Into<FieldList>) -> Self {
        self.expand = Some(fields.into());
        self
    }

    pub fn count(mut self, include: bool) -> Self {
        self.count = Some(include);
        self
    }

    /// Prefix `clause` ahead of the current filter, joined with `and`.
    pub fn and_filter_first(mut self, clause: impl AsRef<str>) -> Self {
        self.filter = Some(combine_filters(clause.as_ref(), self.filter.as_deref()));
        self
    }

    pub fn filter_expr(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    pub fn top_value(&self) -> Option<u32> {
        self.top
    }

    pub fn skip_value(&self) -> Option<u32> {
        self.skip
    }

    /// Serialise into `$`-prefixed query parameters, omitting unset options.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(7);
        if let Some(top) = self.top {
            params.push(("$top", top.min(MAX_TOP).to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("$skip", skip.to_string()));
        }
        if let Some(filter) = &self.filter {
            params.push(("$filter", filter.clone()));
        }
        if let Some(orderby) = &self.orderby {
            params.push(("$orderby", orderby.clone()));
        }
        if let Some(count) = self.count {
            params.push(("$count", count.to_string()));
        }
        if let Some(select) = &self.select {
            params.push(("$select", select.as_str().to_owned()));
        }
        if let Some(expand) = &self.expand {
            params.push(("$expand", expand.as_str().to_owned()));
        }
        params
    }
}

// ── Filter composition ──────────────────────────────────────────────

/// AND-join a convenience clause with an optional caller filter.
///
/// The convenience clause always comes first. A side containing a
/// top-level `or` is parenthesised so `and` cannot bind into it.
pub fn combine_filters(convenience: &str, caller: Option<&str>) -> String {
    match caller.map(str::trim).filter(|c| !c.is_empty()) {
        None => convenience.to_owned(),
        Some(caller) => format!("{} and {}", group(convenience), group(caller)),
    }
}

/// AND-join several clauses in order, grouping any that contain `or`.
pub fn and_all<I, S>(clauses: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = clauses
        .into_iter()
        .map(|c| group(c.as_ref()).into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

fn group(clause: &str) -> Cow<'_, str> {
    if has_top_level_or(clause) {
        Cow::Owned(format!("({clause})"))
    } else {
        Cow::Borrowed(clause)
    }
}

fn has_top_level_or(clause: &str) -> bool {
    let lower = clause.to_ascii_lowercase();
    let mut depth = 0_i32;
    let mut in_literal = false;
    for (i, b) in lower.bytes().enumerate() {
        match b {
            b'\'' => in_literal = !in_literal,
            b'(' if !in_literal => depth += 1,
            b')' if !in_literal => depth -= 1,
            b' ' if !in_literal && depth == 0 => {
                if lower.get(i..).is_some_and(|rest| rest.starts_with(" or ")) {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Quote a string literal for use inside `$filter`, doubling embedded quotes.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `Field eq 'value'`
pub fn eq_clause(field: &str, value: &str) -> String {
    format!("{field} eq {}", quote(value))
}

// ── Date bounds ─────────────────────────────────────────────────────

/// A date or timestamp used in a comparison filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateBound {
    /// Calendar date, compared from midnight UTC.
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Already formatted by the caller; used verbatim inside the quotes.
    Raw(String),
}

impl DateBound {
    /// Canonical `YYYY-MM-DDTHH:MM:SSZ` rendering (no surrounding quotes).
    pub fn to_odata(&self) -> String {
        match self {
            Self::Date(d) => format!("{}T00:00:00Z", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::Secs, true),
            Self::Raw(s) => s.trim().trim_matches('\'').to_owned(),
        }
    }
}

impl fmt::Display for DateBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_odata())
    }
}

impl From<NaiveDate> for DateBound {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime<Utc>> for DateBound {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<&str> for DateBound {
    fn from(s: &str) -> Self {
        Self::Raw(s.to_owned())
    }
}

impl From<String> for DateBound {
    fn from(s: String) -> Self {
        Self::Raw(s)
    }
}

/// `Field op 'YYYY-MM-DDTHH:MM:SSZ'`
pub fn date_clause(field: &str, op: &str, bound: &DateBound) -> String {
    format!("{field} {op} '{}'", bound.to_odata())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn top_is_clamped_to_max() {
        let params = ODataQuery::new().top(500).to_params();
        assert_eq!(param(&params, "$top"), Some("200"));

        let params = ODataQuery::new().top(25).to_params();
        assert_eq!(param(&params, "$top"), Some("25"));
    }

    #[test]
    fn field_lists_join_in_order() {
        let params = ODataQuery::new()
            .select(vec!["B", "A", "C"])
            .expand(["Media", "Member"])
            .to_params();
        assert_eq!(param(&params, "$select"), Some("B,A,C"));
        assert_eq!(param(&params, "$expand"), Some("Media,Member"));
    }

    #[test]
    fn prejoined_field_string_passes_through() {
        let params = ODataQuery::new().select("ListingKey,ListPrice").to_params();
        assert_eq!(param(&params, "$select"), Some("ListingKey,ListPrice"));
    }

    #[test]
    fn count_serialises_as_literal_bool() {
        assert_eq!(
            param(&ODataQuery::new().count(true).to_params(), "$count"),
            Some("true")
        );
        assert_eq!(
            param(&ODataQuery::new().count(false).to_params(), "$count"),
            Some("false")
        );
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!(ODataQuery::new().to_params().is_empty());
    }

    #[test]
    fn params_keep_stable_order() {
        let keys: Vec<_> = ODataQuery::new()
            .expand("Media")
            .select("A")
            .count(true)
            .orderby("ListPrice desc")
            .filter("X eq 1")
            .skip(10)
            .top(5)
            .to_params()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(
            keys,
            vec!["$top", "$skip", "$filter", "$orderby", "$count", "$select", "$expand"]
        );
    }

    #[test]
    fn convenience_clause_comes_first() {
        assert_eq!(
            combine_filters("StandardStatus eq 'Active'", Some("X eq 1")),
            "StandardStatus eq 'Active' and X eq 1"
        );
    }

    #[test]
    fn missing_or_blank_caller_filter_is_ignored() {
        assert_eq!(combine_filters("A eq 1", None), "A eq 1");
        assert_eq!(combine_filters("A eq 1", Some("   ")), "A eq 1");
    }

    #[test]
    fn or_clauses_are_parenthesised() {
        assert_eq!(
            combine_filters(
                "StandardStatus eq 'Active'",
                Some("City eq 'Provo' or City eq 'Orem'")
            ),
            "StandardStatus eq 'Active' and (City eq 'Provo' or City eq 'Orem')"
        );
        assert_eq!(
            combine_filters("A eq 1 OR B eq 2", Some("C eq 3")),
            "(A eq 1 OR B eq 2) and C eq 3"
        );
    }

    #[test]
    fn or_inside_literals_or_groups_is_left_alone() {
        assert_eq!(
            combine_filters("A eq 1", Some("City eq 'Hurricane or Bust'")),
            "A eq 1 and City eq 'Hurricane or Bust'"
        );
        assert_eq!(
            combine_filters("A eq 1", Some("(B eq 1 or B eq 2)")),
            "A eq 1 and (B eq 1 or B eq 2)"
        );
    }

    #[test]
    fn and_all_joins_and_groups() {
        assert_eq!(and_all(Vec::<String>::new()), None);
        assert_eq!(
            and_all(["A eq 1", "B eq 2 or B eq 3"]).unwrap(),
            "A eq 1 and (B eq 2 or B eq 3)"
        );
    }

    #[test]
    fn quote_doubles_embedded_quotes() {
        assert_eq!(quote("O'Brien"), "'O''Brien'");
        assert_eq!(eq_clause("City", "St. George"), "City eq 'St. George'");
    }

    #[test]
    fn dates_serialise_canonically() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            date_clause("ModificationTimestamp", "gt", &date.into()),
            "ModificationTimestamp gt '2024-03-01T00:00:00Z'"
        );

        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
        assert_eq!(
            date_clause("ModificationTimestamp", "gt", &ts.into()),
            "ModificationTimestamp gt '2024-03-01T14:05:09Z'"
        );

        assert_eq!(
            date_clause("CloseDate", "ge", &"'2024-01-01T00:00:00Z'".into()),
            "CloseDate ge '2024-01-01T00:00:00Z'"
        );
    }
}

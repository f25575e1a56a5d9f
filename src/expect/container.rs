use super::{Expectation, Family};
use crate::errors::Outcome;
use crate::value::Value;

/// Items of a value seen as a collection: list elements, map keys, or the
/// value itself as a singleton.
fn items(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        Value::Map(map) => map.keys().cloned().map(Value::Text).collect(),
        other => vec![other.clone()],
    }
}

/// Collapses duplicates, keeping first occurrences.
fn distinct(values: Vec<Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

impl<'r> Expectation<'r> {
    fn container(&self, assertion: &str) -> Outcome<&[Value]> {
        match (&self.family, self.actual.as_list()) {
            (Family::Container, Some(items)) => Ok(items),
            _ => Err(self.unsupported(assertion)),
        }
    }

    /// Length first, then element by element through the registry so nested
    /// values get their own family's comparison and message.
    pub(super) fn container_equal(&self, expected: &Value) -> Outcome<&Self> {
        let claim = self.claim("equal").expected(expected);
        let (Some(actual), Some(wanted)) = (self.actual.as_list(), expected.as_list()) else {
            return self.verdict(false, claim);
        };
        if actual.len() != wanted.len() {
            let detail = format!(
                "but its length is {} instead of {}",
                actual.len(),
                wanted.len()
            );
            return self.verdict(false, claim.detail(detail));
        }
        for (index, (a, b)) in actual.iter().zip(wanted).enumerate() {
            if let Some(mismatch) = self.nested_mismatch(a, b)? {
                let detail = format!("but element [{}] differs: {}", index, mismatch);
                return self.verdict(false, claim.detail(detail));
            }
        }
        self.verdict(true, claim)
    }

    pub(super) fn container_contain(&self, item: &Value) -> Outcome<&Self> {
        let holds = self.container("to_contain")?.contains(item);
        self.verdict(holds, self.claim("contain").expected(item))
    }

    /// Order-insensitive; duplicates collapse.
    pub fn to_be_superset_of(&self, other: impl Into<Value>) -> Outcome<&Self> {
        let actual = distinct(self.container("to_be_superset_of")?.to_vec());
        let other = other.into();
        let missing: Vec<Value> = distinct(items(&other))
            .into_iter()
            .filter(|item| !actual.contains(item))
            .collect();
        let claim = self
            .claim("be a superset of")
            .expected(&other)
            .detail(format!("but it lacks {}", Value::List(missing.clone())));
        self.verdict(missing.is_empty(), claim)
    }

    /// Order-insensitive; duplicates collapse.
    pub fn to_be_subset_of(&self, other: impl Into<Value>) -> Outcome<&Self> {
        let actual = distinct(self.container("to_be_subset_of")?.to_vec());
        let other = other.into();
        let universe = distinct(items(&other));
        let extra: Vec<Value> = actual
            .into_iter()
            .filter(|item| !universe.contains(item))
            .collect();
        let claim = self
            .claim("be a subset of")
            .expected(&other)
            .detail(format!("but {} are not in it", Value::List(extra.clone())));
        self.verdict(extra.is_empty(), claim)
    }
}

use im::OrdMap;

use super::{Expectation, Family};
use crate::errors::Outcome;
use crate::value::Value;

/// Map keys are strings; other key values are matched by their display form
/// without quotes.
fn key_of(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        other => other.to_string(),
    }
}

impl<'r> Expectation<'r> {
    fn dictionary(&self, assertion: &str) -> Outcome<&OrdMap<String, Value>> {
        match (&self.family, self.actual.as_map()) {
            (Family::Dictionary, Some(map)) => Ok(map),
            _ => Err(self.unsupported(assertion)),
        }
    }

    /// Length first, then every actual key in sorted order must be present in
    /// `expected` with an equal value.
    pub(super) fn dictionary_equal(&self, expected: &Value) -> Outcome<&Self> {
        let claim = self.claim("equal").expected(expected);
        let (Some(actual), Some(wanted)) = (self.actual.as_map(), expected.as_map()) else {
            return self.verdict(false, claim);
        };
        if actual.len() != wanted.len() {
            let detail = format!(
                "but it has {} entries instead of {}",
                actual.len(),
                wanted.len()
            );
            return self.verdict(false, claim.detail(detail));
        }
        for (key, value) in actual.iter() {
            let Some(other) = wanted.get(key) else {
                let detail = format!("but key {:?} is missing from the expected map", key);
                return self.verdict(false, claim.detail(detail));
            };
            if let Some(mismatch) = self.nested_mismatch(value, other)? {
                let detail = format!("but the value for key {:?} differs: {}", key, mismatch);
                return self.verdict(false, claim.detail(detail));
            }
        }
        self.verdict(true, claim)
    }

    pub fn to_contain_key(&self, key: impl Into<Value>) -> Outcome<&Self> {
        let key = key.into();
        let holds = self.dictionary("to_contain_key")?.contains_key(&key_of(&key));
        self.verdict(holds, self.claim("contain key").expected(&key))
    }

    /// The key must be present and its value equal, numbers within the
    /// configured tolerance.
    pub fn to_contain_entry(&self, key: impl Into<Value>, value: impl Into<Value>) -> Outcome<&Self> {
        let (key, value) = (key.into(), value.into());
        let map = self.dictionary("to_contain_entry")?;
        let claim = self
            .claim("contain entry")
            .expected(format!("{}: {}", key_of(&key), value));
        match map.get(&key_of(&key)) {
            None => self.verdict(false, claim.detail(format!("but it has no key {}", key))),
            Some(found) => {
                let mismatch = if found.kind().is_compatible_with(value.kind()) {
                    self.nested_mismatch(found, &value)?
                } else {
                    Some(format!("found {}", found))
                };
                match mismatch {
                    None => self.verdict(true, claim),
                    Some(_) => self.verdict(false, claim.detail(format!("but its value is {}", found))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expect::ExpectationRegistry;

    #[test]
    fn first_missing_key_is_reported_in_sorted_order() {
        let registry = ExpectationRegistry::with_defaults();
        let err = registry
            .expect(Value::map([("b", 1), ("a", 1)]))
            .to_equal(Value::map([("b", 1), ("c", 1)]))
            .unwrap_err();
        assert!(err.message().contains("key \"a\" is missing"));
    }

    #[test]
    fn nested_values_use_their_own_family() {
        let registry = ExpectationRegistry::with_defaults();
        let err = registry
            .expect(Value::map([("a", "x\ny")]))
            .to_equal(Value::map([("a", "x\nz")]))
            .unwrap_err();
        assert!(err.message().contains("value for key \"a\" differs"));
        assert!(err.message().contains("diff (-expected +actual)"));
    }

    #[test]
    fn entries_compare_with_tolerance_and_kind_mismatch_is_a_miss() {
        let registry = ExpectationRegistry::with_defaults();
        let e = registry.expect(Value::map([("e", 2.71)]));
        e.to_contain_entry("e", 2.71).unwrap();
        e.not().to_contain_entry("e", "2.71").unwrap();
        e.to_contain_key("e").unwrap();
        e.not().to_contain_key("tau").unwrap();
    }
}

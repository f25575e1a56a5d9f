//! Spy assertions. With `for_call_number(n)` set, existence and argument
//! checks look at the `n`th call only; counting assertions always use the
//! total.

use super::{Expectation, Family};
use crate::errors::{Exception, Outcome, VALUE_ERROR};
use crate::spy::Spy;
use crate::value::Args;

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st.
fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn times(n: usize) -> String {
    match n {
        1 => "once".to_string(),
        2 => "twice".to_string(),
        n => format!("{} times", n),
    }
}

impl<'r> Expectation<'r> {
    fn spy(&self, assertion: &str) -> Outcome<&Spy> {
        match (&self.family, self.actual.as_spy()) {
            (Family::Spy, Some(spy)) => Ok(spy),
            _ => Err(self.unsupported(assertion)),
        }
    }

    fn checked_call_number(&self) -> Outcome<Option<usize>> {
        match self.settings.call_number {
            Some(0) => Err(Exception::new(
                &VALUE_ERROR,
                self.with_prefix("call numbers start at 1".to_string()),
            )),
            other => Ok(other),
        }
    }

    pub fn to_have_been_called(&self) -> Outcome<&Self> {
        let count = self.spy("to_have_been_called")?.call_count();
        let detail = format!("but it was called {}", times(count));
        match self.checked_call_number()? {
            Some(n) => {
                let claim = self
                    .claim(format!("have been called a {} time", ordinal(n)))
                    .detail(detail);
                self.verdict(count >= n, claim)
            }
            None => self.verdict(count > 0, self.claim("have been called").detail(detail)),
        }
    }

    fn count_check(
        &self,
        assertion: &str,
        operation: &str,
        n: usize,
        holds: impl Fn(usize) -> bool,
    ) -> Outcome<&Self> {
        let count = self.spy(assertion)?.call_count();
        let claim = self
            .claim(format!("have been called {}", operation))
            .expected(times(n))
            .detail(format!("but it was called {}", times(count)));
        self.verdict(holds(count), claim)
    }

    pub fn to_have_been_called_exactly(&self, n: usize) -> Outcome<&Self> {
        self.count_check("to_have_been_called_exactly", "exactly", n, |count| count == n)
    }

    pub fn to_have_been_called_at_least(&self, n: usize) -> Outcome<&Self> {
        self.count_check("to_have_been_called_at_least", "at least", n, |count| count >= n)
    }

    pub fn to_have_been_called_at_most(&self, n: usize) -> Outcome<&Self> {
        self.count_check("to_have_been_called_at_most", "at most", n, |count| count <= n)
    }

    /// Matches any recorded call, or only the configured call number.
    pub fn to_have_been_called_with(&self, args: Args) -> Outcome<&Self> {
        let spy = self.spy("to_have_been_called_with")?;
        match self.checked_call_number()? {
            Some(n) => {
                let claim = self.claim(format!(
                    "have been called with {} on its {} call",
                    args,
                    ordinal(n)
                ));
                match spy.nth_call(n) {
                    Some(record) => {
                        let detail = format!("but the {} call was made with {}", ordinal(n), record.args);
                        self.verdict(record.args == args, claim.detail(detail))
                    }
                    None => {
                        let detail = format!("but it was only called {}", times(spy.call_count()));
                        self.verdict(false, claim.detail(detail))
                    }
                }
            }
            None => {
                let calls = spy.calls();
                let claim = self.claim("have been called with").expected(&args);
                let detail = if calls.is_empty() {
                    "but it was never called".to_string()
                } else {
                    let made: Vec<String> = calls.iter().map(|c| c.args.to_string()).collect();
                    format!("but its calls were {}", made.join(", "))
                };
                let holds = calls.iter().any(|c| c.args == args);
                self.verdict(holds, claim.detail(detail))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals() {
        let rendered: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 101, 111]
            .into_iter()
            .map(ordinal)
            .collect();
        assert_eq!(
            rendered,
            ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "101st", "111th"]
        );
    }

    #[test]
    fn counts_read_naturally() {
        assert_eq!(times(0), "0 times");
        assert_eq!(times(1), "once");
        assert_eq!(times(2), "twice");
        assert_eq!(times(7), "7 times");
    }
}

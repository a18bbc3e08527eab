use std::{cmp::Ordering, iter::Peekable, str::Chars};

/// Ordering of tree items by id.
///
/// The default is plain lexicographic order. With `alphanumeric`, runs of
/// digits compare as numbers, so `a9` sorts before `a12`. With
/// `case_insensitive`, letters compare without case and ties fall back to the
/// case-sensitive order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyComparator {
    pub alphanumeric: bool,
    pub case_insensitive: bool,
}

impl KeyComparator {
    pub fn lexicographic() -> Self {
        Self::default()
    }

    pub fn alphanumeric() -> Self {
        Self {
            alphanumeric: true,
            case_insensitive: true,
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if !self.alphanumeric && !self.case_insensitive {
            return a.cmp(b);
        }
        self.compare_folded(a, b).then_with(|| a.cmp(b))
    }

    fn compare_folded(&self, a: &str, b: &str) -> Ordering {
        let mut left = a.chars().peekable();
        let mut right = b.chars().peekable();
        loop {
            match (left.peek().copied(), right.peek().copied()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(l), Some(r))
                    if self.alphanumeric && l.is_ascii_digit() && r.is_ascii_digit() =>
                {
                    let ordering = compare_numbers(&take_digits(&mut left), &take_digits(&mut right));
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                (Some(l), Some(r)) => {
                    left.next();
                    right.next();
                    let ordering = self.fold(l).cmp(&self.fold(r));
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
            }
        }
    }

    fn fold(&self, c: char) -> char {
        if self.case_insensitive {
            c.to_lowercase().next().unwrap_or(c)
        } else {
            c
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

/// Numeric comparison of two digit runs of any length. Equal numbers order the
/// run with fewer leading zeros first.
fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(comparator: KeyComparator, keys: &[&str]) -> Vec<String> {
        let mut keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        keys.sort_by(|a, b| comparator.compare(a, b));
        keys
    }

    #[test]
    fn test_lexicographic_default() {
        assert_eq!(
            sorted(KeyComparator::default(), &["a12", "a9", "B", "a"]),
            vec!["B", "a", "a12", "a9"]
        );
    }

    #[test]
    fn test_alphanumeric_digit_runs() {
        assert_eq!(
            sorted(KeyComparator::alphanumeric(), &["item12", "item9", "item010", "item10"]),
            vec!["item9", "item10", "item010", "item12"]
        );
    }

    #[test]
    fn test_case_insensitive_with_tiebreak() {
        assert_eq!(
            sorted(KeyComparator::alphanumeric(), &["b", "B", "a", "A"]),
            vec!["A", "a", "B", "b"]
        );
        let comparator = KeyComparator {
            alphanumeric: false,
            case_insensitive: true,
        };
        assert_eq!(comparator.compare("Zeta", "alpha"), Ordering::Greater);
        assert_eq!(comparator.compare("x1", "x1"), Ordering::Equal);
    }

    #[test]
    fn test_long_digit_runs_do_not_overflow() {
        let comparator = KeyComparator::alphanumeric();
        assert_eq!(
            comparator.compare("k99999999999999999999999", "k100000000000000000000000"),
            Ordering::Less
        );
    }
}

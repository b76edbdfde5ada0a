use std::cmp::Ordering;

/// Like `a.partial_cmp(b)`, but treats NAN as equal to everything so sorting never panics
pub fn partial_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Returns the difference between the largest and smallest values, or `None` if the iterator is
/// empty
pub fn range<I: IntoIterator<Item = f64>>(iter: I) -> Option<f64> {
    iter.into_iter().fold(None, |acc, x| match acc {
        Some((min, max)) => Some((f64::min(min, x), f64::max(max, x))),
        None => Some((x, x)),
    })
    .map(|(min, max)| max - min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_cmp() {
        assert_eq!(Ordering::Less, partial_cmp(1.0, 2.0));
        assert_eq!(Ordering::Greater, partial_cmp(2.0, 1.0));
        assert_eq!(Ordering::Equal, partial_cmp(f64::NAN, 1.0));
    }

    #[test]
    fn test_range() {
        assert_eq!(None, range(Vec::new()));
        assert_eq!(Some(0.0), range(vec![3.0]));
        assert_eq!(Some(5.0), range(vec![1.0, -2.0, 3.0, 0.5]));
    }
}

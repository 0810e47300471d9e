//! Data cleaning applied before augmentation.

/// Strip zero cross sections from the ends of a curve.
///
/// Trailing points are removed while their cross section is exactly zero.
/// Leading points are removed two at a time while the first two are both
/// zero, so a single zero at threshold survives.
pub fn remove_zeros(data: &mut Vec<(f64, f64)>) {
    while data.last().is_some_and(|&(_, sigma)| sigma == 0.0) {
        data.pop();
    }

    let mut start = 0;
    while data.len() >= start + 2 && data[start].1 == 0.0 && data[start + 1].1 == 0.0 {
        start += 2;
    }
    data.drain(..start);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_pair_and_trailing_zero() {
        let mut data = vec![(1.0, 0.0), (2.0, 0.0), (3.0, 5.0), (4.0, 0.0)];
        remove_zeros(&mut data);
        assert_eq!(data, vec![(3.0, 5.0)]);
    }

    #[test]
    fn test_single_threshold_zero_kept() {
        let mut data = vec![(0.29, 0.0), (1.0, 2.0e-20), (2.0, 1.0e-20)];
        remove_zeros(&mut data);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_odd_leading_zeros() {
        let mut data = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 1.0)];
        remove_zeros(&mut data);
        assert_eq!(data, vec![(2.0, 0.0), (3.0, 1.0)]);
    }

    #[test]
    fn test_all_zero_and_empty() {
        let mut data = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)];
        remove_zeros(&mut data);
        assert!(data.is_empty());

        let mut empty: Vec<(f64, f64)> = Vec::new();
        remove_zeros(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_interior_zeros_untouched() {
        let mut data = vec![(1.0, 1.0), (2.0, 0.0), (3.0, 0.0), (4.0, 2.0)];
        remove_zeros(&mut data);
        assert_eq!(data.len(), 4);
    }
}

//! # Line List Search
//!
//! Binary search over the rest-frame line frequency table.
//!
//! The table is sorted strictly decreasing (blue to red), so a packet
//! redshifting through the ejecta encounters lines in table order. The
//! search returns the smallest index whose frequency lies at or below the
//! comoving frequency, i.e. the next line the packet can come into
//! resonance with.

use crate::constants::CLOSE_LINE_THRESHOLD;

/// Find the next redward line for a comoving frequency
///
/// Returns the smallest index i with `line_list_nu[i] <= nu`, or
/// `line_list_nu.len()` when the frequency lies redward of the whole
/// table. Contract: for all i < result, `line_list_nu[i] > nu`.
pub fn search_redward(line_list_nu: &[f64], nu: f64) -> usize {
    let n = line_list_nu.len();
    if n == 0 || line_list_nu[0] <= nu {
        return 0;
    }
    if nu < line_list_nu[n - 1] {
        return n;
    }

    // Bisection invariant: line_list_nu[lo] > nu >= line_list_nu[hi]
    let mut lo = 0;
    let mut hi = n - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if line_list_nu[mid] > nu {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    hi
}

/// Whether two adjacent rest frequencies are close enough that the second
/// must be processed at zero distance after crossing the first
#[inline]
pub fn is_close_line(nu_next: f64, nu_line: f64) -> bool {
    (nu_next - nu_line).abs() / nu_line < CLOSE_LINE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_list() -> Vec<f64> {
        // Strictly decreasing, blue to red
        vec![9.0e14, 7.0e14, 5.0e14, 3.0e14, 1.0e14]
    }

    #[test]
    fn test_search_interior() {
        let nus = sample_list();
        // Between 7e14 and 5e14: next redward line is index 2
        assert_eq!(search_redward(&nus, 6.0e14), 2);
        // Between 9e14 and 7e14
        assert_eq!(search_redward(&nus, 8.0e14), 1);
    }

    #[test]
    fn test_search_exact_hits() {
        let nus = sample_list();
        // An exact table value is its own next line
        assert_eq!(search_redward(&nus, 9.0e14), 0);
        assert_eq!(search_redward(&nus, 5.0e14), 2);
        assert_eq!(search_redward(&nus, 1.0e14), 4);
    }

    #[test]
    fn test_search_boundaries() {
        let nus = sample_list();
        // Blueward of the whole table
        assert_eq!(search_redward(&nus, 1.0e15), 0);
        // Redward of the whole table: off the red end
        assert_eq!(search_redward(&nus, 0.5e14), nus.len());
    }

    #[test]
    fn test_search_empty_list() {
        assert_eq!(search_redward(&[], 5.0e14), 0);
    }

    #[test]
    fn test_search_contract_exhaustive() {
        let nus: Vec<f64> = (0..1000).map(|i| 1.0e15 / (1.0 + i as f64 * 0.01)).collect();
        for k in 0..2000 {
            let nu = 0.9e14 + k as f64 * 5.0e11;
            let idx = search_redward(&nus, nu);
            for (i, &v) in nus.iter().enumerate().take(idx) {
                assert!(v > nu, "contract violated at i={}, idx={}", i, idx);
            }
            if idx < nus.len() {
                assert!(nus[idx] <= nu);
            }
        }
    }

    #[test]
    fn test_close_line_predicate() {
        let nu = 5.0e14;
        assert!(is_close_line(nu * (1.0 - 1.0e-9), nu));
        assert!(is_close_line(nu * (1.0 - 9.9e-8), nu));
        assert!(!is_close_line(nu * (1.0 - 2.0e-7), nu));
        assert!(!is_close_line(nu * 0.9, nu));
    }
}

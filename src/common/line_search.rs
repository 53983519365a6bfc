use crate::constants::LINE_SEARCH_MAX_ITER;


/// `2 - φ`, where `φ` is the golden ratio.
const C: f64 = 0.381966011;


/// Minimizes the unimodal function `f` over `[x1, x3]`
/// by golden-section search and returns the abscissa of the minimum.
///
/// The search stops once the bracket is narrower than
/// `eps + eps * (|x2| + |x4|)`,
/// or after `LINE_SEARCH_MAX_ITER` iterations.
/// The bounds may be given in any order.
pub fn golden_section<F>(mut x1: f64, mut x3: f64, f: F, eps: f64) -> f64
    where F: Fn(f64) -> f64,
{
    if x3 < x1 {
        std::mem::swap(&mut x1, &mut x3);
    }

    // (x3 - x2) / (x2 - x1) is the golden ratio and x4 - x1 = x3 - x2.
    let mut x2 = x1 + C * (x3 - x1);
    let mut x4 = x1 - x2 + x3;

    let mut f2 = f(x2);
    let mut f4 = f(x4);

    let mut iter = 0;
    while (x3 - x1).abs() > eps + eps * (x2.abs() + x4.abs())
        && iter < LINE_SEARCH_MAX_ITER
    {
        if f4 < f2 {
            x1 = x2;
            x2 = x4;
            x4 = x2 + C * (x3 - x2);
            f2 = f4;
            f4 = f(x4);
        } else {
            x3 = x4;
            x4 = x2;
            x2 = x4 + C * (x1 - x4);
            f4 = f2;
            f2 = f(x2);
        }
        iter += 1;
    }

    if f2 < f4 { x2 } else { x4 }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;


    #[test]
    fn finds_the_vertex_of_a_parabola() {
        let x = golden_section(0.0, 10.0, |x| (x - 3.0).powi(2), 1e-6);
        assert_abs_diff_eq!(x, 3.0, epsilon = 1e-4);
    }


    #[test]
    fn accepts_reversed_bounds() {
        let x = golden_section(10.0, 0.0, |x| (x - 7.5).powi(2) + 1.0, 1e-6);
        assert_abs_diff_eq!(x, 7.5, epsilon = 1e-4);
    }


    #[test]
    fn monotone_functions_end_at_the_boundary() {
        let x = golden_section(0.0, 10.0, |x| (-x).exp(), 1e-6);
        assert_abs_diff_eq!(x, 10.0, epsilon = 1e-3);
    }


    #[test]
    fn terminates_without_meeting_the_tolerance() {
        // A negative tolerance can never be met.
        let x = golden_section(0.0, 1.0, |x| (x - 0.25).abs(), -1.0);
        assert!((0.0..=1.0).contains(&x));
    }
}

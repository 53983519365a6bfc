//! The multiclass exponential loss minimized by `AdaBoost`.
use rayon::prelude::*;


/// Recomputes the cost matrix from the hypotheses:
/// `costs[s][l] = exp(h[s][l] - h[s][y])` for every `l != y`
/// and `costs[s][y]` is the opposite of their sum,
/// where `y` is the label of sample `s`.
/// Each row of `costs` sums to zero.
pub(crate) fn update_costs(
    hypotheses: &[Vec<f64>],
    labels: &[usize],
    costs: &mut [Vec<f64>],
)
{
    costs.par_iter_mut()
        .zip(hypotheses)
        .zip(labels)
        .for_each(|((cost, hyp), &y)| {
            let mut sum = 0.0;
            for (l, (c, h)) in cost.iter_mut().zip(hyp).enumerate() {
                if l != y {
                    *c = (h - hyp[y]).exp();
                    sum += *c;
                }
            }
            cost[y] = -sum;
        });
}


/// The loss of the ensemble after adding a weak learner
/// with weight `alpha`, as a function of `alpha`.
///
/// This is the loss of
/// "A Theory of Multiclass Boosting" (Mukherjee and Schapire),
/// averaged over the samples.
pub(crate) struct AdaBoostLoss<'a> {
    labels: &'a [usize],
    predictions: &'a [usize],
    costs: &'a [Vec<f64>],
}


impl<'a> AdaBoostLoss<'a> {
    pub(crate) fn new(
        labels: &'a [usize],
        predictions: &'a [usize],
        costs: &'a [Vec<f64>],
    ) -> Self
    {
        Self { labels, predictions, costs }
    }


    /// Evaluates the loss at `alpha`.
    pub(crate) fn eval(&self, alpha: f64) -> f64 {
        let exp_alpha = alpha.exp();
        let exp_minus_alpha = 1.0 / exp_alpha;

        let loss = self.costs.iter()
            .zip(self.labels)
            .zip(self.predictions)
            .map(|((cost, &y), &p)| {
                let a = if p == y { exp_minus_alpha } else { 1.0 };
                cost.iter()
                    .enumerate()
                    .filter(|&(l, _)| l != y)
                    .map(|(l, c)| {
                        let b = if p == l { exp_alpha } else { 1.0 };
                        c * a * b
                    })
                    .sum::<f64>()
            })
            .sum::<f64>();

        loss / self.labels.len() as f64
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;


    #[test]
    fn cost_rows_sum_to_zero() {
        let hypotheses = vec![
            vec![0.0, 0.0, 0.0],
            vec![1.5, -0.5, 2.0],
            vec![0.3, 4.0, -1.0],
        ];
        let labels = vec![0, 2, 1];
        let mut costs = vec![vec![0.0; 3]; 3];
        update_costs(&hypotheses, &labels, &mut costs);

        for (row, &y) in costs.iter().zip(&labels) {
            assert_relative_eq!(row.iter().sum::<f64>(), 0.0, epsilon = 1e-12);
            assert!(row[y] < 0.0);
        }
        assert_relative_eq!(costs[0][1], 1.0);
        assert_relative_eq!(costs[1][0], (-0.5f64).exp());
    }


    #[test]
    fn loss_at_zero_is_the_mean_cost() {
        let labels = vec![0, 1];
        let predictions = vec![0, 0];
        let costs = vec![vec![-2.0, 2.0], vec![1.0, -1.0]];
        let loss = AdaBoostLoss::new(&labels, &predictions, &costs);

        assert_relative_eq!(loss.eval(0.0), 1.5);
        // The first sample is right, the second one is wrong.
        let alpha = 0.5f64;
        let expected = (2.0 * (-alpha).exp() + alpha.exp()) / 2.0;
        assert_relative_eq!(loss.eval(alpha), expected);
    }
}

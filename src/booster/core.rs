//! Provides `Booster` trait.
use crate::Result;

use std::ops::ControlFlow;


/// The trait [`Booster`] defines the standard framework of boosting:
/// a pre-processing step, a sequence of rounds, and a post-processing step
/// that outputs the trained model.
///
/// Every step may fail; a failure aborts the whole run.
///
/// # Required Methods
/// - [`Booster::name`]
/// - [`Booster::preprocess`]
/// - [`Booster::boost`]
/// - [`Booster::postprocess`]
/// - [`Booster::info`] ... optional.
///
/// # Provided Methods
/// - [`Booster::run`]
pub(crate) trait Booster {
    /// The model output by the boosting algorithm.
    type Output;


    /// Returns the name of the boosting algorithm.
    fn name(&self) -> &str;


    /// Returns the parameters of the boosting algorithm.
    fn info(&self) -> Option<Vec<(&str, String)>> {
        None
    }


    /// A main function that runs the boosting algorithm.
    fn run(&mut self) -> Result<Self::Output> {
        self.preprocess()?;

        let flow = (1..).try_for_each(|iter| {
            match self.boost(iter) {
                Ok(ControlFlow::Continue(())) => ControlFlow::Continue(()),
                Ok(ControlFlow::Break(_)) => ControlFlow::Break(Ok(())),
                Err(e) => ControlFlow::Break(Err(e)),
            }
        });
        if let ControlFlow::Break(Err(e)) = flow {
            return Err(e);
        }

        self.postprocess()
    }


    /// Pre-processing for `self`.
    /// As you can see in [`Booster::run`],
    /// this method is called before the boosting process.
    fn preprocess(&mut self) -> Result<()>;


    /// Boosting step per iteration.
    /// This method returns
    /// `ControlFlow::Continue(())` to go on with the next round,
    /// `ControlFlow::Break(n_rounds)` once the training is over,
    /// where `n_rounds` is the number of committed rounds.
    fn boost(&mut self, iteration: usize) -> Result<ControlFlow<usize>>;


    /// Post-processing.
    fn postprocess(&mut self) -> Result<Self::Output>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoostError;


    /// Counts rounds until `stop`, failing at `fail` if set.
    struct Counter {
        stop: usize,
        fail: Option<usize>,
        rounds: Vec<usize>,
    }


    impl Booster for Counter {
        type Output = Vec<usize>;


        fn name(&self) -> &str {
            "Counter"
        }


        fn preprocess(&mut self) -> Result<()> {
            self.rounds.clear();
            Ok(())
        }


        fn boost(&mut self, iteration: usize) -> Result<ControlFlow<usize>> {
            if Some(iteration) == self.fail {
                return Err(BoostError::logic("round failed"));
            }
            if iteration > self.stop {
                return Ok(ControlFlow::Break(self.stop));
            }
            self.rounds.push(iteration);
            Ok(ControlFlow::Continue(()))
        }


        fn postprocess(&mut self) -> Result<Self::Output> {
            Ok(std::mem::take(&mut self.rounds))
        }
    }


    #[test]
    fn run_stops_on_break() {
        let mut booster = Counter { stop: 3, fail: None, rounds: Vec::new() };
        assert_eq!(booster.run().unwrap(), vec![1, 2, 3]);
        assert!(booster.info().is_none());
    }


    #[test]
    fn run_propagates_round_errors() {
        let mut booster = Counter { stop: 5, fail: Some(2), rounds: Vec::new() };
        let err = booster.run().unwrap_err();
        assert!(matches!(err, BoostError::Logic(_)));
    }
}

use rand::{
    Rng,
    distr::{Distribution, weighted::WeightedIndex},
};

use crate::config::Bias;
use crate::maze::Direction;

impl Bias {
    /// Selection weight of `direction`: the bias strength for the biased direction, 1 otherwise.
    pub fn weight(&self, direction: Direction) -> u32 {
        match self.direction {
            Some(d) if d == direction => self.strength,
            _ => 1,
        }
    }

    /// Weighted random pick among candidate directions.
    /// Returns the index of the chosen candidate, or `None` if there are no candidates.
    /// Weights are summed as `u64`, so any strength up to `u32::MAX` is accepted.
    pub fn choose_index<R, I>(&self, directions: I, rng: &mut R) -> Option<usize>
    where
        R: Rng + ?Sized,
        I: IntoIterator<Item = Direction>,
    {
        let weights = directions.into_iter().map(|d| u64::from(self.weight(d)));
        WeightedIndex::new(weights).ok().map(|dist| dist.sample(rng))
    }

    /// Probability used by row-based carvers for a step along the bias axis.
    /// With no bias (or strength 1) this is 1/2; the favoured axis gets `s/(s+1)`.
    pub fn axis_probability(&self, vertical: bool) -> f64 {
        let strength = self.strength.max(1) as f64;
        match self.direction {
            Some(d) if d.is_vertical() == vertical => strength / (strength + 1.0),
            Some(_) => 1.0 / (strength + 1.0),
            None => 0.5,
        }
    }
}

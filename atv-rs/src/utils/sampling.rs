use crate::{Count, Error, Real, Result};
use rand::Rng;
use rand_distr::{Binomial, Distribution, Poisson};

/// Draw from Binomial(n, p). Degenerate cases are resolved without sampling.
pub fn binomial(n: Count, p: Real, rng: &mut impl Rng) -> Result<Count> {
    if n == 0 || p <= 0.0 {
        return Ok(0);
    }
    if p >= 1.0 {
        return Ok(n);
    }
    let distrib = Binomial::new(n, p).map_err(|e| Error::Sampling(format!("{} (n={}, p={})", e, n, p)))?;
    Ok(distrib.sample(rng))
}

/// Draw from Poisson(lambda). A zero mean yields zero.
pub fn poisson(lambda: Real, rng: &mut impl Rng) -> Result<Count> {
    if lambda == 0.0 {
        return Ok(0);
    }
    let distrib =
        Poisson::new(lambda).map_err(|e| Error::Sampling(format!("{} (lambda={})", e, lambda)))?;
    let x: Real = distrib.sample(rng);
    Ok(x as Count)
}

/// Probability of leaving a compartment within one day given the total exit
/// rate (individuals per day) and its current size.
pub fn exit_probability(total_rate: Real, size: Count) -> Real {
    if size == 0 || total_rate <= 0.0 {
        return 0.0;
    }
    1.0 - (-total_rate / size as Real).exp()
}

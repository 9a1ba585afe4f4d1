use super::Address;
use rand::{
    distributions::{Alphanumeric, DistString as _, Distribution, Standard},
    Rng,
};

impl Distribution<Address> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Address {
        Address(format!("n{}", Alphanumeric.sample_string(rng, 10)))
    }
}

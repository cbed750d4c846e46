//! Property-based tests.

use num_bigint::{BigUint, RandPrime};
use num_integer::Integer;
use num_traits::One;
use proptest::prelude::*;
use rand_chacha::ChaCha8Rng;
use rand_core::SeedableRng;
use rsqueeze::{
    protocol, reassemble_key,
    traits::{PrivateKeyParts, PublicKeyParts},
    RsaPublicKey, SqueezeVariant, SqueezedKey, Totient,
};

prop_compose! {
    // WARNING: do *NOT* copy and paste this code. Primes this small are
    // only fit for tests.
    fn prime_pair()(seed in any::<[u8; 32]>()) -> (BigUint, BigUint) {
        let mut rng = ChaCha8Rng::from_seed(seed);
        loop {
            let p = rng.gen_prime(256);
            let q = rng.gen_prime(256);
            if p != q {
                return (p, q);
            }
        }
    }
}

fn public_key_for(p: &BigUint, q: &BigUint) -> Option<RsaPublicKey> {
    let e = BigUint::from(65537u32);
    let lambda = (p - BigUint::one()).lcm(&(q - BigUint::one()));
    if !e.gcd(&lambda).is_one() {
        return None;
    }
    RsaPublicKey::new(p * q, e).ok()
}

fn variant() -> impl Strategy<Value = SqueezeVariant> {
    prop::sample::select(SqueezeVariant::ALL.to_vec())
}

fn totient() -> impl Strategy<Value = Totient> {
    prop::sample::select(vec![Totient::Euler, Totient::Carmichael])
}

proptest! {
    #[test]
    fn reassembled_key_is_consistent(
        (p, q) in prime_pair(),
        totient in totient(),
        msg in any::<[u8; 32]>(),
    ) {
        let public_key = public_key_for(&p, &q);
        prop_assume!(public_key.is_some());
        let public_key = public_key.unwrap();

        let private_key = reassemble_key(&public_key, &p, totient).unwrap();
        prop_assert!(private_key.validate().is_ok());
        prop_assert_eq!(private_key.q(), &q);
        prop_assert_eq!(&(private_key.p() * private_key.q()), public_key.n());

        let t = totient.apply(&p, &q).unwrap();
        prop_assert!(((private_key.d() * public_key.e()) % &t).is_one());

        let m = BigUint::from_bytes_be(&msg) % public_key.n();
        let c = m.modpow(public_key.e(), public_key.n());
        prop_assert_eq!(c.modpow(private_key.d(), public_key.n()), m);
    }

    #[test]
    fn protocol_round_trip((p, q) in prime_pair(), variant in variant()) {
        let public_key = public_key_for(&p, &q);
        prop_assume!(public_key.is_some());
        let public_key = public_key.unwrap();

        let key = SqueezedKey::with_public_key(p.clone(), public_key.clone());
        let encoded = protocol::encode(&key, variant).unwrap();
        let decoded = protocol::decode(&encoded).unwrap();

        prop_assert_eq!(decoded.prime_p(), &p);
        if variant.embeds_public_key() {
            prop_assert_eq!(decoded.public_key(), Some(&public_key));
        } else {
            prop_assert_eq!(decoded.public_key(), None);
        }

        // either prime restores the same modulus
        let restored = reassemble_key(&public_key, &q, Totient::default()).unwrap();
        prop_assert_eq!(restored.p(), &q);
        prop_assert_eq!(restored.to_public_key(), public_key);
    }
}

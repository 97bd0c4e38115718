//! Built-in value UDFs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rand::{Rng, RngCore};

use cdesynth_core::ResponseValue;
use cdesynth_plan::{CallArgs, Registry, UdfError};

const DEFAULT_UPPER_ID: i64 = 999_999;

/// Register the built-in UDFs: `test_record_id`, `age_generator` and
/// `zip_code_generator`.
pub fn register_builtin(registry: &mut Registry) {
    let pool = Arc::new(Mutex::new(UniqueIdPool::default()));
    registry.register_udf(
        "test_record_id",
        move |args: &CallArgs, rng: &mut dyn RngCore| test_record_id(&pool, args, rng),
    );
    registry.register_udf("age_generator", age_generator);
    registry.register_udf("zip_code_generator", zip_code_generator);
}

/// Ids in `[0, upper]` handed out without replacement.
///
/// Ids are drawn at random and remembered until half the range is used; the
/// unused remainder is then listed once and drawn from directly.
#[derive(Debug, Default)]
pub struct UniqueIdPool {
    upper: Option<u32>,
    issued: HashSet<u32>,
    unused: Option<Vec<u32>>,
}

impl UniqueIdPool {
    /// Refill the pool when the upper bound changes.
    pub fn configure(&mut self, upper: u32) {
        if self.upper != Some(upper) {
            self.upper = Some(upper);
            self.issued.clear();
            self.unused = None;
        }
    }

    fn capacity(&self) -> u64 {
        self.upper.map_or(0, |upper| u64::from(upper) + 1)
    }

    pub fn remaining(&self) -> u64 {
        match &self.unused {
            Some(unused) => unused.len() as u64,
            None => self.capacity() - self.issued.len() as u64,
        }
    }

    pub fn take(&mut self, rng: &mut dyn RngCore) -> Option<u32> {
        let upper = self.upper?;
        if self.unused.is_none() && self.issued.len() as u64 * 2 >= self.capacity() {
            let issued = std::mem::take(&mut self.issued);
            self.unused = Some((0..=upper).filter(|id| !issued.contains(id)).collect());
        }

        if let Some(unused) = &mut self.unused {
            if unused.is_empty() {
                return None;
            }
            let index = rng.random_range(0..unused.len());
            return Some(unused.swap_remove(index));
        }

        loop {
            let id = rng.random_range(0..=upper);
            if self.issued.insert(id) {
                return Some(id);
            }
        }
    }
}

fn test_record_id(
    pool: &Mutex<UniqueIdPool>,
    args: &CallArgs,
    rng: &mut dyn RngCore,
) -> Result<ResponseValue, UdfError> {
    let upper = args.i64_or(0, "upper_id", DEFAULT_UPPER_ID)?;
    let upper = u32::try_from(upper).map_err(|_| UdfError::InvalidArgument {
        name: "upper_id".to_string(),
        message: format!("must be between 0 and {} (got {upper})", u32::MAX),
    })?;

    let mut pool = pool
        .lock()
        .map_err(|_| UdfError::Other("record id pool lock poisoned".to_string()))?;
    pool.configure(upper);
    let id = pool.take(rng).ok_or_else(|| {
        UdfError::ResourceExhausted(format!(
            "ran out of record ids in [0, {upper}]; more records were requested than ids available"
        ))
    })?;
    Ok(ResponseValue::Text(format!("TEST_{id:06}")))
}

fn age_generator(args: &CallArgs, rng: &mut dyn RngCore) -> Result<ResponseValue, UdfError> {
    let min_age = args.require_i64(0, "min_age")?;
    let max_age = args.require_i64(1, "max_age")?;
    if min_age > max_age {
        return Err(UdfError::InvalidArgument {
            name: "min_age".to_string(),
            message: format!("must not exceed max_age ({min_age} > {max_age})"),
        });
    }
    Ok(ResponseValue::Int(rng.random_range(min_age..=max_age)))
}

fn zip_code_generator(_args: &CallArgs, rng: &mut dyn RngCore) -> Result<ResponseValue, UdfError> {
    let zip: u32 = rng.random_range(1..=99_999);
    Ok(ResponseValue::Text(format!("{zip:05}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdesynth_plan::PlanError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        register_builtin(&mut registry);
        registry
    }

    #[test]
    fn record_ids_are_unique_until_exhausted() {
        let registry = registry();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let args = CallArgs::positional(vec![json!(9)]);

        let mut seen = HashSet::new();
        for _ in 0..10 {
            let value = registry.invoke_udf("test_record_id", &args, &mut rng).unwrap();
            let id = value.as_str().unwrap().to_string();
            assert!(id.starts_with("TEST_00000"), "{id}");
            assert!(seen.insert(id));
        }

        let err = registry
            .invoke_udf("test_record_id", &args, &mut rng)
            .unwrap_err();
        assert!(err.is_resource_exhausted());
        assert!(matches!(err, PlanError::Udf { name, .. } if name == "test_record_id"));
    }

    #[test]
    fn changing_upper_id_refills_pool() {
        let mut pool = UniqueIdPool::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        pool.configure(0);
        assert_eq!(pool.take(&mut rng), Some(0));
        assert_eq!(pool.take(&mut rng), None);

        pool.configure(0);
        assert_eq!(pool.remaining(), 0);
        pool.configure(4);
        assert_eq!(pool.remaining(), 5);
    }

    #[test]
    fn large_upper_id_hands_out_ids_without_listing_the_range() {
        let mut pool = UniqueIdPool::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        pool.configure(u32::MAX);
        assert_eq!(pool.remaining(), u64::from(u32::MAX) + 1);

        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            assert!(seen.insert(pool.take(&mut rng).unwrap()));
        }
        assert_eq!(pool.remaining(), u64::from(u32::MAX) + 1 - 1_000);
        assert!(pool.unused.is_none());
    }

    #[test]
    fn dense_pool_still_yields_every_id_once() {
        let mut pool = UniqueIdPool::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        pool.configure(99);

        let mut seen = HashSet::new();
        while let Some(id) = pool.take(&mut rng) {
            assert!(id <= 99);
            assert!(seen.insert(id));
        }
        assert_eq!(seen.len(), 100);
        assert_eq!(pool.remaining(), 0);
    }

    #[test]
    fn age_and_zip_stay_in_range() {
        let registry = registry();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let args = CallArgs::positional(vec![json!(18), json!(20)]);

        for _ in 0..100 {
            let age = registry.invoke_udf("age_generator", &args, &mut rng).unwrap();
            assert!((18..=20).contains(&age.as_i64().unwrap()));

            let zip = registry
                .invoke_udf("zip_code_generator", &CallArgs::default(), &mut rng)
                .unwrap();
            let zip = zip.as_str().unwrap();
            assert_eq!(zip.len(), 5);
            assert_ne!(zip, "00000");
        }
    }

    #[test]
    fn age_generator_requires_bounds() {
        let registry = registry();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let err = registry
            .invoke_udf("age_generator", &CallArgs::default(), &mut rng)
            .unwrap_err();
        assert!(matches!(
            err,
            PlanError::Udf {
                source: UdfError::MissingArgument(_),
                ..
            }
        ));
    }
}

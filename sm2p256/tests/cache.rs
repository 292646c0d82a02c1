//! Key table cache behaviour under an engine.

use sm2p256::{
    arithmetic::{PrecomputedTable, ProjectivePoint},
    rand_core::OsRng,
    Engine, EngineConfig, PublicKey, Scalar,
};
use std::{
    num::NonZeroUsize,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Barrier,
    },
    thread,
};

fn public_key(k: u64) -> PublicKey {
    let point = ProjectivePoint::GENERATOR * &Scalar::from_u64(k);
    PublicKey::from_affine(point.to_affine()).unwrap()
}

fn small_engine(capacity: usize) -> Engine {
    Engine::new(
        EngineConfig::default()
            .with_table_cache_capacity(NonZeroUsize::new(capacity).unwrap())
            .with_cache_generated_keys(false),
    )
}

#[test]
fn concurrent_lookups_share_one_table() {
    const THREADS: usize = 8;

    let engine = Arc::new(small_engine(4));
    let key = public_key(7);
    let fingerprint = key.fingerprint();
    let builds = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let key = key.clone();
            let builds = Arc::clone(&builds);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                barrier.wait();
                engine
                    .cache()
                    .get_or_build(&key.fingerprint(), || {
                        builds.fetch_add(1, Ordering::SeqCst);
                        Ok(PrecomputedTable::new(key.as_affine()))
                    })
                    .unwrap()
            })
        })
        .collect();

    let tables: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let cached = engine.cache().get(&fingerprint).unwrap();

    assert!(builds.load(Ordering::SeqCst) >= 1);
    for table in &tables {
        assert!(Arc::ptr_eq(table, &cached));
    }
    assert_eq!(engine.cache().len(), 1);
}

#[test]
fn verification_populates_cache() {
    let engine = small_engine(4);
    let key = public_key(11);
    let k = Scalar::from_u64(5);

    assert!(engine.cache().is_empty());
    let first = engine.mul_point(&key, &k).unwrap();
    assert_eq!(engine.cache().stats().misses, 1);

    let attached = Arc::clone(key.attached_table().unwrap());
    let second = engine.mul_point(&key, &k).unwrap();
    assert_eq!(first, second);
    assert!(Arc::ptr_eq(&attached, &engine.public_key_table(&key).unwrap()));
    assert_eq!(engine.cache().stats().hits, 0);
    assert_eq!(first, ProjectivePoint::GENERATOR * &Scalar::from_u64(55));
}

#[test]
fn eviction_keeps_results_correct() {
    let engine = small_engine(2);
    let keys: Vec<_> = (2..6).map(public_key).collect();
    let k = Scalar::from_u64(3);

    for key in &keys {
        engine.mul_point(key, &k).unwrap();
    }

    assert_eq!(engine.cache().len(), 2);
    assert_eq!(engine.cache().stats().evictions, 2);
    assert!(!engine.cache().contains(&keys[0].fingerprint()));
    assert!(engine.cache().contains(&keys[3].fingerprint()));

    // served from the attached table
    let expected = ProjectivePoint::GENERATOR * &Scalar::from_u64(6);
    assert_eq!(engine.mul_point(&keys[0], &k).unwrap(), expected);
}

#[test]
fn attached_table_survives_eviction() {
    let engine = Engine::new(
        EngineConfig::default().with_table_cache_capacity(NonZeroUsize::new(1).unwrap()),
    );

    let first = engine.generate_key(&mut OsRng).unwrap();
    let second = engine.generate_key(&mut OsRng).unwrap();

    assert!(!engine.cache().contains(&first.public_key().fingerprint()));
    assert!(engine.cache().contains(&second.public_key().fingerprint()));

    let attached = Arc::clone(first.public_key().attached_table().unwrap());
    let looked_up = engine.public_key_table(first.public_key()).unwrap();
    assert!(Arc::ptr_eq(&attached, &looked_up));

    let sig = engine.sign(&first, b"evicted", None, &mut OsRng).unwrap();
    assert!(engine
        .verify(first.public_key(), b"evicted", None, &sig)
        .unwrap());
}

#[test]
fn looked_up_table_outlives_eviction() {
    let engine = small_engine(1);
    let key = public_key(13);
    let other = public_key(17);
    let hash = [0x42; 32];

    let d = Scalar::from_u64(13);
    let sk = engine.private_key_from_scalar(d).unwrap();
    let sig = engine.sign_prehash(&sk, &hash, &mut OsRng).unwrap();

    assert!(engine.verify_prehash(&key, &hash, &sig).unwrap());
    let attached = Arc::clone(key.attached_table().unwrap());

    for _ in 0..3 {
        engine.mul_point(&other, &Scalar::ONE).unwrap();
        assert!(!engine.cache().contains(&key.fingerprint()));

        assert!(engine.verify_prehash(&key, &hash, &sig).unwrap());
        let table = engine.public_key_table(&key).unwrap();
        assert!(Arc::ptr_eq(&attached, &table));
    }

    let stats = engine.cache().stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.evictions, 1);
}

#[test]
fn generated_keys_skip_cache_when_disabled() {
    let engine = small_engine(4);
    let key = engine.generate_key(&mut OsRng).unwrap();

    assert!(key.public_key().attached_table().is_none());
    assert!(engine.cache().is_empty());
}

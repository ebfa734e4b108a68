//! Dump/load round-trips through the native binary format.

use approx::assert_relative_eq;
use hoeffding::{
    Attribute, HoeffdingTree, MapInstance, Model, NumericSplitter, PersistError, TreeConfig,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

fn mushroom_model() -> Model {
    Model::new(
        Attribute::nominal_with_levels("edible", &["yes", "no"]),
        vec![
            Attribute::nominal("cap"),
            Attribute::numeric("diameter"),
            Attribute::nominal("odor"),
        ],
    )
}

fn mushroom_instance(rng: &mut impl Rng) -> MapInstance {
    let caps = ["flat", "bell", "conical"];
    let odors = ["none", "almond", "foul"];
    let cap = caps[rng.gen_range(0..caps.len())];
    let odor = odors[rng.gen_range(0..odors.len())];
    let diameter: f64 = rng.gen_range(1.0..20.0);
    let edible = if odor == "foul" || diameter > 15.0 { "no" } else { "yes" };
    MapInstance::new()
        .set("cap", cap)
        .set("diameter", diameter)
        .set("odor", odor)
        .set("edible", edible)
}

#[test]
fn a_loaded_tree_agrees_on_held_out_instances() {
    let config = TreeConfig::builder()
        .grace_period(20.0)
        .split_confidence(1e-3)
        .build()
        .unwrap();
    let tree = HoeffdingTree::new(mushroom_model(), config.clone()).unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    for _ in 0..300 {
        tree.train(&mushroom_instance(&mut rng));
    }
    assert!(tree.info().num_nodes > 1, "expected a grown tree");

    let mut dump = Vec::new();
    tree.dump_to(&mut dump).unwrap();
    let loaded = HoeffdingTree::load(dump.as_slice(), config).unwrap();

    assert_eq!(tree.info(), loaded.info());
    for _ in 0..100 {
        let probe = mushroom_instance(&mut rng);
        let original = tree.predict(&probe);
        let roundtripped = loaded.predict(&probe);
        assert_eq!(original.index(), roundtripped.index());
        assert_relative_eq!(original.top().votes, roundtripped.top().votes);
    }
}

#[test]
fn a_loaded_tree_continues_training() {
    let config = TreeConfig::builder().grace_period(20.0).build().unwrap();
    let tree = HoeffdingTree::new(mushroom_model(), config.clone()).unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);
    for _ in 0..100 {
        tree.train(&mushroom_instance(&mut rng));
    }

    let mut dump = Vec::new();
    tree.dump_to(&mut dump).unwrap();
    let loaded = HoeffdingTree::load(dump.as_slice(), config).unwrap();

    // The loaded tree keeps its sufficient statistics, so training picks up
    // where the dump left off.
    for _ in 0..500 {
        loaded.train(&mushroom_instance(&mut rng));
    }
    assert!(loaded.info().num_nodes >= tree.info().num_nodes);
}

#[test]
fn regression_trees_roundtrip_exactly() {
    let model = Model::new(Attribute::numeric("y"), vec![Attribute::numeric("x")]);
    let config = TreeConfig::builder().grace_period(30.0).build().unwrap();
    let tree = HoeffdingTree::new(model, config.clone()).unwrap();

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    for _ in 0..400 {
        let x: f64 = rng.gen_range(-5.0..5.0);
        let y = if x < 0.0 { -10.0 + x } else { 10.0 + x };
        tree.train(&MapInstance::new().set("x", x).set("y", y));
    }

    let mut dump = Vec::new();
    tree.dump_to(&mut dump).unwrap();
    let loaded = HoeffdingTree::load(dump.as_slice(), config).unwrap();

    for x in [-4.5, -1.0, 0.5, 3.0] {
        let probe = MapInstance::new().set("x", x);
        assert_eq!(
            tree.predict(&probe).value().to_bits(),
            loaded.predict(&probe).value().to_bits(),
            "prediction at x={x} must be bit-identical"
        );
    }
}

#[test]
fn an_untrained_tree_roundtrips() {
    let tree = HoeffdingTree::new(mushroom_model(), TreeConfig::default()).unwrap();
    let mut dump = Vec::new();
    tree.dump_to(&mut dump).unwrap();

    let loaded = HoeffdingTree::load(dump.as_slice(), TreeConfig::default()).unwrap();
    assert_eq!(loaded.info().num_nodes, 1);
}

#[test]
fn loading_with_a_mismatched_config_fails_fast() {
    let model = Model::new(Attribute::numeric("y"), vec![Attribute::numeric("x")]);
    let tree = HoeffdingTree::new(model, TreeConfig::default()).unwrap();
    let mut dump = Vec::new();
    tree.dump_to(&mut dump).unwrap();

    // A Gaussian numeric splitter cannot serve a regression target.
    let config = TreeConfig::builder()
        .splitter_numeric(NumericSplitter::Gaussian)
        .build()
        .unwrap();
    let result = HoeffdingTree::load(dump.as_slice(), config);
    assert!(matches!(result, Err(PersistError::Config(_))));
}

#[test]
fn truncated_dumps_are_rejected() {
    let tree = HoeffdingTree::new(mushroom_model(), TreeConfig::default()).unwrap();
    let mut dump = Vec::new();
    tree.dump_to(&mut dump).unwrap();

    let truncated = &dump[..dump.len() - 1];
    assert!(matches!(
        HoeffdingTree::load(truncated, TreeConfig::default()),
        Err(PersistError::Codec(_))
    ));
}

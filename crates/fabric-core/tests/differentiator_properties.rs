use fabric_core::{calculate_shadow_view_mutations, DifferentiatorMode, MutationKind};
use fabric_testing::prelude::*;
use proptest::prelude::*;

const MODES: [DifferentiatorMode; 2] = [
    DifferentiatorMode::Classic,
    DifferentiatorMode::OptimizedMoves,
];

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn diffing_a_tree_against_itself_is_empty(seed in any::<u64>(), size in 1usize..40) {
        let mut generator = RandomTreeGenerator::new(seed);
        let forest = generator.generate(size);
        let mut builder = TreeBuilder::new(1);
        let root = builder.root(&forest);
        for mode in MODES {
            prop_assert!(calculate_shadow_view_mutations(mode, &root, &root).is_empty());
        }
    }

    #[test]
    fn rebuilt_equal_trees_diff_to_nothing(seed in any::<u64>(), size in 1usize..40) {
        let mut generator = RandomTreeGenerator::new(seed);
        let forest = generator.generate(size);
        let mut builder = TreeBuilder::new(1);
        let first = builder.root(&forest);
        let second = builder.root(&forest);
        for mode in MODES {
            prop_assert!(calculate_shadow_view_mutations(mode, &first, &second).is_empty());
        }
    }

    #[test]
    fn mutations_replay_to_the_new_tree(
        seed in any::<u64>(),
        size in 1usize..40,
        edits in 1usize..8,
    ) {
        let mut generator = RandomTreeGenerator::new(seed);
        let before = generator.generate(size);
        let after = generator.mutate(&before, edits);
        let mut builder = TreeBuilder::new(1);
        let old = builder.root(&before);
        let new = builder.root(&after);

        let classic = assert_mutations_replay(DifferentiatorMode::Classic, &old, &new);
        let optimized = assert_mutations_replay(DifferentiatorMode::OptimizedMoves, &old, &new);
        assert_removals_precede_insertions(&classic);
        assert_removals_precede_insertions(&optimized);
        prop_assert!(optimized.len() <= classic.len());

        // Moves are the only thing the modes disagree on.
        for kind in [MutationKind::Create, MutationKind::Delete, MutationKind::Update] {
            prop_assert_eq!(count_kind(&classic, kind), count_kind(&optimized, kind));
        }
    }

    #[test]
    fn diffing_back_restores_the_old_tree(
        seed in any::<u64>(),
        size in 1usize..30,
        edits in 1usize..5,
    ) {
        let mut generator = RandomTreeGenerator::new(seed);
        let before = generator.generate(size);
        let after = generator.mutate(&before, edits);
        let mut builder = TreeBuilder::new(1);
        let old = builder.root(&before);
        let new = builder.root(&after);
        for mode in MODES {
            assert_mutations_replay(mode, &new, &old);
        }
    }
}

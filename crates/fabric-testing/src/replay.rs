use fabric_core::{
    calculate_shadow_view_mutations, DifferentiatorMode, MutationKind, ShadowNode,
    ShadowViewMutation, ShadowViewMutationList, StubViewTree,
};

/// Diffs `old` against `new`, applies the result to a stub hierarchy built
/// from `old` and asserts it ends up equal to the one built from `new`.
pub fn assert_mutations_replay(
    mode: DifferentiatorMode,
    old: &ShadowNode,
    new: &ShadowNode,
) -> ShadowViewMutationList {
    let mutations = calculate_shadow_view_mutations(mode, old, new);
    let mut views = StubViewTree::from_shadow_tree(old);
    if let Err(error) = views.apply(&mutations) {
        panic!(
            "{:?}: {} while applying\n{}\nold tree:\n{}new tree:\n{}",
            mode,
            error,
            describe(&mutations),
            old.dump_tree(),
            new.dump_tree()
        );
    }
    let expected = StubViewTree::from_shadow_tree(new);
    assert!(
        views == expected,
        "{:?}: replayed hierarchy differs\nreplayed:\n{:?}expected:\n{:?}mutations:\n{}",
        mode,
        views,
        expected,
        describe(&mutations)
    );
    mutations
}

/// Asserts that no Remove or Delete follows a Create or Insert.
pub fn assert_removals_precede_insertions(mutations: &[ShadowViewMutation]) {
    let first_addition = mutations.iter().position(|mutation| {
        matches!(mutation.kind(), MutationKind::Create | MutationKind::Insert)
    });
    if let Some(first_addition) = first_addition {
        let late = mutations[first_addition..].iter().find(|mutation| {
            matches!(mutation.kind(), MutationKind::Remove | MutationKind::Delete)
        });
        assert!(
            late.is_none(),
            "{} after an addition in\n{}",
            late.map(ToString::to_string).unwrap_or_default(),
            describe(mutations)
        );
    }
}

pub fn count_kind(mutations: &[ShadowViewMutation], kind: MutationKind) -> usize {
    mutations
        .iter()
        .filter(|mutation| mutation.kind() == kind)
        .count()
}

fn describe(mutations: &[ShadowViewMutation]) -> String {
    mutations
        .iter()
        .map(|mutation| format!("  {mutation}\n"))
        .collect()
}

//! Reconciler Tests
//!
//! Scenario tests for move and compaction batches, plus property checks
//! that every batch keeps containers gapless.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::reconciler::*;
    use crate::domain::{Item, ItemId, ItemKind, Monitor, MonitorType, ScriptType, Trigger};
    use crate::repository::ItemRepository;

    fn trigger(id: &str) -> Item {
        Item::trigger(
            id,
            id,
            Trigger {
                script_type: ScriptType::Shell,
                script_content: "echo".to_string(),
            },
        )
    }

    fn monitor(id: &str) -> Item {
        Item::monitor(id, id, Monitor::new(MonitorType::Api, "http://localhost/health"))
    }

    fn g(id: &str) -> Option<ItemId> {
        Some(ItemId::from(id))
    }

    /// root [T1, G1, T2], G1 [M1]
    fn scenario() -> Vec<Item> {
        vec![
            trigger("T1").placed(None, 0),
            Item::group("G1", "G1").placed(None, 1),
            trigger("T2").placed(None, 2),
            monitor("M1").placed(g("G1"), 0),
        ]
    }

    fn apply(items: &[Item], reconciliation: &Reconciliation) -> ItemRepository {
        let mut repo = ItemRepository::with_items(items.to_vec());
        repo.apply_positions(reconciliation.updates()).unwrap();
        repo
    }

    fn layout(repo: &ItemRepository, container: Option<&ItemId>) -> Vec<(String, u32)> {
        repo.get_items_by_container(container)
            .into_iter()
            .map(|item| (item.id.to_string(), item.position))
            .collect()
    }

    fn pairs(expected: &[(&str, u32)]) -> Vec<(String, u32)> {
        expected.iter().map(|(id, pos)| (id.to_string(), *pos)).collect()
    }

    #[test]
    fn test_trigger_dropped_on_group_goes_to_end() {
        let items = scenario();
        let request = resolve_drop(&items, &ItemId::from("T2"), &DropTarget::Group(ItemId::from("G1"))).unwrap();
        assert_eq!(request, MoveRequest::new(ItemId::from("T2"), g("G1"), 1));

        let result = reconcile(&items, &request).unwrap();
        let repo = apply(&items, &result);
        assert_eq!(layout(&repo, None), pairs(&[("T1", 0), ("G1", 1)]));
        assert_eq!(layout(&repo, g("G1").as_ref()), pairs(&[("M1", 0), ("T2", 1)]));
    }

    #[test]
    fn test_monitor_dragged_out_to_root_area() {
        let items = vec![
            trigger("T1").placed(None, 0),
            Item::group("G1", "G1").placed(None, 1),
            monitor("M1").placed(g("G1"), 0),
        ];
        let request = resolve_drop(&items, &ItemId::from("M1"), &DropTarget::RootArea).unwrap();
        assert_eq!(request.target_index, 2);

        let result = reconcile(&items, &request).unwrap();
        let Reconciliation::Move(batch) = &result else {
            panic!("expected a move");
        };
        assert_eq!(batch.after, Placement::root(2));
        assert_eq!(batch.before, Placement::in_group(ItemId::from("G1"), 0));

        let repo = apply(&items, &result);
        assert_eq!(layout(&repo, None), pairs(&[("T1", 0), ("G1", 1), ("M1", 2)]));
        assert!(repo.get_items_by_container(g("G1").as_ref()).is_empty());
    }

    #[test]
    fn test_reorder_within_root_moves_like_array_move() {
        let items = scenario();
        // T1 dropped on T2: T1 ends up where T2 was
        let request = resolve_drop(&items, &ItemId::from("T1"), &DropTarget::Item(ItemId::from("T2"))).unwrap();
        let repo = apply(&items, &reconcile(&items, &request).unwrap());
        assert_eq!(layout(&repo, None), pairs(&[("G1", 0), ("T2", 1), ("T1", 2)]));

        // T2 dropped on T1: T2 goes first
        let request = resolve_drop(&items, &ItemId::from("T2"), &DropTarget::Item(ItemId::from("T1"))).unwrap();
        let repo = apply(&items, &reconcile(&items, &request).unwrap());
        assert_eq!(layout(&repo, None), pairs(&[("T2", 0), ("T1", 1), ("G1", 2)]));
    }

    #[test]
    fn test_drop_on_item_in_other_container_moves_across() {
        let items = scenario();
        let request = resolve_drop(&items, &ItemId::from("T1"), &DropTarget::Item(ItemId::from("M1"))).unwrap();
        assert_eq!(request, MoveRequest::new(ItemId::from("T1"), g("G1"), 0));

        let repo = apply(&items, &reconcile(&items, &request).unwrap());
        assert_eq!(layout(&repo, None), pairs(&[("G1", 0), ("T2", 1)]));
        assert_eq!(layout(&repo, g("G1").as_ref()), pairs(&[("T1", 0), ("M1", 1)]));
    }

    #[test]
    fn test_group_on_group_reorders_at_root() {
        let items = vec![
            Item::group("G1", "G1").placed(None, 0),
            trigger("T1").placed(None, 1),
            Item::group("G2", "G2").placed(None, 2),
            monitor("M1").placed(g("G2"), 0),
        ];
        let request = resolve_drop(&items, &ItemId::from("G1"), &DropTarget::Group(ItemId::from("G2"))).unwrap();
        assert_eq!(request.target_container, None);

        let repo = apply(&items, &reconcile(&items, &request).unwrap());
        assert_eq!(layout(&repo, None), pairs(&[("T1", 0), ("G2", 1), ("G1", 2)]));
        assert_eq!(layout(&repo, g("G2").as_ref()), pairs(&[("M1", 0)]));
    }

    #[test]
    fn test_group_request_into_group_is_rewritten_at_reconciler() {
        let items = vec![
            Item::group("G1", "G1").placed(None, 0),
            Item::group("G2", "G2").placed(None, 1),
        ];
        let request = MoveRequest::new(ItemId::from("G2"), g("G1"), 5);
        let Reconciliation::Move(batch) = reconcile(&items, &request).unwrap() else {
            panic!("expected a move");
        };
        assert!(batch.updates.iter().all(|u| u.container.is_none()));
        assert_eq!(batch.after, Placement::root(0));
    }

    #[test]
    fn test_group_dropped_on_grouped_item_reorders_relative_to_holder() {
        let items = vec![
            Item::group("G1", "G1").placed(None, 0),
            trigger("T1").placed(None, 1),
            Item::group("G2", "G2").placed(None, 2),
            monitor("M1").placed(g("G1"), 0),
        ];
        let request = resolve_drop(&items, &ItemId::from("G2"), &DropTarget::Item(ItemId::from("M1"))).unwrap();
        assert_eq!(request, MoveRequest::new(ItemId::from("G2"), None, 0));
    }

    #[test]
    fn test_item_target_naming_group_uses_group_rule() {
        let items = scenario();
        let request = resolve_drop(&items, &ItemId::from("T1"), &DropTarget::Item(ItemId::from("G1"))).unwrap();
        assert_eq!(request, MoveRequest::new(ItemId::from("T1"), g("G1"), 1));
    }

    #[test]
    fn test_drop_on_self_is_noop() {
        let items = scenario();
        let request = resolve_drop(&items, &ItemId::from("T2"), &DropTarget::Item(ItemId::from("T2"))).unwrap();
        let result = reconcile(&items, &request).unwrap();
        assert!(result.is_noop());
        assert!(result.updates().is_empty());
    }

    #[test]
    fn test_root_area_drop_of_last_root_item_is_noop() {
        let items = scenario();
        let request = resolve_drop(&items, &ItemId::from("T2"), &DropTarget::RootArea).unwrap();
        assert!(reconcile(&items, &request).unwrap().is_noop());
    }

    #[test]
    fn test_out_of_range_index_clamps() {
        let items = scenario();
        let request = MoveRequest::new(ItemId::from("T1"), None, 99);
        let repo = apply(&items, &reconcile(&items, &request).unwrap());
        assert_eq!(layout(&repo, None), pairs(&[("G1", 0), ("T2", 1), ("T1", 2)]));
    }

    #[test]
    fn test_unknown_item_fails() {
        let items = scenario();
        let err = reconcile(&items, &MoveRequest::new(ItemId::from("nope"), None, 0)).unwrap_err();
        assert_eq!(err, DomainError::ItemNotFound("nope".to_string()));

        let err = resolve_drop(&items, &ItemId::from("T1"), &DropTarget::Item(ItemId::from("ghost"))).unwrap_err();
        assert_eq!(err, DomainError::ItemNotFound("ghost".to_string()));
    }

    #[test]
    fn test_unknown_container_fails() {
        let items = scenario();
        let err = reconcile(&items, &MoveRequest::new(ItemId::from("T1"), g("G9"), 0)).unwrap_err();
        assert_eq!(err, DomainError::ContainerNotFound("G9".to_string()));

        // a trigger id is not a container
        let err = reconcile(&items, &MoveRequest::new(ItemId::from("T1"), g("T2"), 0)).unwrap_err();
        assert_eq!(err, DomainError::ContainerNotFound("T2".to_string()));
    }

    #[test]
    fn test_move_repairs_gaps_left_by_delete() {
        let items = vec![
            trigger("A").placed(None, 0),
            trigger("C").placed(None, 2),
            trigger("D").placed(None, 3),
        ];
        // dropping A at its own index still compacts the container
        let result = reconcile(&items, &MoveRequest::new(ItemId::from("A"), None, 0)).unwrap();
        assert!(!result.is_noop());
        let repo = apply(&items, &result);
        assert!(repo.validate_container(None).is_ok());
    }

    #[test]
    fn test_plan_compaction() {
        let items = vec![
            trigger("A").placed(g("G"), 1),
            trigger("B").placed(g("G"), 4),
            Item::group("G", "G").placed(None, 0),
        ];
        let updates = plan_compaction(&items, g("G").as_ref());
        let positions: Vec<(&str, u32)> = updates.iter().map(|u| (u.id.as_str(), u.position)).collect();
        assert_eq!(positions, vec![("A", 0), ("B", 1)]);
        assert!(updates.iter().all(|u| u.kind == ItemKind::Trigger && u.container == g("G")));

        assert!(plan_compaction(&items, None).is_empty());
    }

    // ========================
    // Property tests
    // ========================

    /// Gapless layout: `groups` groups at root followed by items spread over
    /// root and the groups according to `homes`
    fn build_layout(groups: usize, homes: &[usize], monitors: &[bool]) -> Vec<Item> {
        let mut items = Vec::new();
        let mut next = vec![0u32; groups + 1];

        for index in 0..groups {
            items.push(Item::group(format!("G{}", index), "group").placed(None, next[0]));
            next[0] += 1;
        }
        for (index, home) in homes.iter().enumerate() {
            let slot = home % (groups + 1);
            let container = if slot == 0 { None } else { g(&format!("G{}", slot - 1)) };
            let id = format!("I{}", index);
            let item = if monitors.get(index).copied().unwrap_or(false) {
                monitor(&id)
            } else {
                trigger(&id)
            };
            items.push(item.placed(container, next[slot]));
            next[slot] += 1;
        }
        items
    }

    fn containers(items: &[Item]) -> Vec<Option<ItemId>> {
        let mut list: Vec<Option<ItemId>> = vec![None];
        list.extend(items.iter().filter(|i| i.is_group()).map(|i| Some(i.id.clone())));
        list
    }

    fn assert_gapless(repo: &ItemRepository, items: &[Item]) {
        for container in containers(items) {
            assert!(repo.validate_container(container.as_ref()).is_ok(), "gap in {:?}", container);
        }
    }

    proptest! {
        #[test]
        fn prop_moves_keep_every_container_gapless(
            groups in 0..4usize,
            homes in proptest::collection::vec(0..8usize, 0..12),
            monitors in proptest::collection::vec(any::<bool>(), 12),
            moves in proptest::collection::vec((0..16usize, 0..5usize, 0..16usize), 1..20)
        ) {
            let mut repo = ItemRepository::with_items(build_layout(groups, &homes, &monitors));
            let total = repo.len();
            prop_assume!(total > 0);

            for (dragged, container, index) in moves {
                let items = repo.items().to_vec();
                let dragged = &items[dragged % items.len()];
                let all = containers(&items);
                let target = all[container % all.len()].clone();

                let request = MoveRequest::new(dragged.id.clone(), target, index);
                let result = reconcile(&items, &request).unwrap();
                repo.apply_positions(result.updates()).unwrap();

                assert_gapless(&repo, &items);
                // groups stay at root
                prop_assert!(repo.items().iter().filter(|i| i.is_group()).all(|i| i.container.is_none()));
            }

            // container isolation: every item appears in exactly one view
            let items = repo.items().to_vec();
            let seen: usize = containers(&items)
                .iter()
                .map(|c| {
                    let view = repo.get_items_by_container(c.as_ref());
                    assert!(view.iter().all(|item| &item.container == c));
                    view.len()
                })
                .sum();
            prop_assert_eq!(seen, total);
        }

        #[test]
        fn prop_move_to_current_slot_is_noop(
            groups in 0..4usize,
            homes in proptest::collection::vec(0..8usize, 1..12),
            pick in 0..16usize
        ) {
            let items = build_layout(groups, &homes, &[]);
            let item = &items[pick % items.len()];
            let request = MoveRequest::new(item.id.clone(), item.container.clone(), item.position as usize);

            let result = reconcile(&items, &request).unwrap();
            prop_assert!(result.is_noop());
            prop_assert!(result.updates().is_empty());
        }

        #[test]
        fn prop_cross_container_move_splits_cleanly(
            homes in proptest::collection::vec(0..2usize, 1..10),
            pick in 0..10usize,
            index in 0..12usize
        ) {
            let items = build_layout(1, &homes, &[]);
            let movable: Vec<&Item> = items.iter().filter(|i| !i.is_group()).collect();
            let dragged = movable[pick % movable.len()];
            let target = if dragged.container.is_some() { None } else { g("G0") };

            let result = reconcile(&items, &MoveRequest::new(dragged.id.clone(), target.clone(), index)).unwrap();
            let repo = apply(&items, &result);

            prop_assert_eq!(&repo.get(&dragged.id).unwrap().container, &target);
            prop_assert!(repo.validate_container(None).is_ok());
            prop_assert!(repo.validate_container(g("G0").as_ref()).is_ok());
        }
    }
}

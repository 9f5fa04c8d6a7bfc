use fenris_fault::sieve::Sieve;
use proptest::collection::btree_set;
use proptest::prelude::*;

#[test]
fn cones_are_ordered_by_color_and_supports_by_id() {
    let mut sieve = Sieve::new();
    sieve.add_arrow(3, 10, 2);
    sieve.add_arrow(1, 10, 0);
    sieve.add_arrow(2, 10, 1);
    sieve.add_arrow(1, 7, 0);

    assert_eq!(sieve.cone(10).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert_eq!(sieve.support(1).collect::<Vec<_>>(), vec![7, 10]);
    assert_eq!(sieve.cone_size(10), 3);
    assert_eq!(sieve.support_size(1), 2);
    assert_eq!(sieve.max_cone_size(), 3);
    assert_eq!(sieve.max_point(), Some(10));
}

#[test]
fn adding_existing_arrow_replaces_color() {
    let mut sieve = Sieve::new();
    sieve.add_arrow(1, 5, 0);
    sieve.add_arrow(2, 5, 1);
    sieve.add_arrow(1, 5, 2);

    assert_eq!(sieve.cone(5).collect::<Vec<_>>(), vec![2, 1]);
    assert_eq!(sieve.support_size(1), 1);
    assert_eq!(sieve.support_arrows(1)[0].color, 2);
}

#[test]
fn set_cone_removes_old_supports() {
    let mut sieve = Sieve::new();
    sieve.set_cone(0, &[1, 2, 3]);
    sieve.set_cone(0, &[4, 2, 3]);

    assert_eq!(sieve.cone(0).collect::<Vec<_>>(), vec![4, 2, 3]);
    assert_eq!(sieve.support_size(1), 0);
    assert_eq!(sieve.support(2).collect::<Vec<_>>(), vec![0]);
    // The old point is still known to the sieve
    assert!(sieve.contains(1));
}

#[test]
fn join_finds_points_covering_all_given_points() {
    let mut sieve = Sieve::new();
    sieve.set_cone(0, &[10, 11, 12]);
    sieve.set_cone(1, &[10, 12, 13]);
    sieve.set_cone(2, &[11, 13, 14]);

    assert_eq!(sieve.join(&[10, 12]), vec![0, 1]);
    assert_eq!(sieve.join(&[12, 13]), vec![1]);
    assert_eq!(sieve.join(&[10, 14]), Vec::<usize>::new());
    assert_eq!(sieve.join(&[]), Vec::<usize>::new());
}

#[test]
fn closure_visits_points_breadth_first_once() {
    let mut sieve = Sieve::new();
    // A cell with two edges sharing a vertex
    sieve.set_cone(0, &[1, 2]);
    sieve.set_cone(1, &[3, 4]);
    sieve.set_cone(2, &[4, 5]);

    assert_eq!(sieve.closure(0), vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(sieve.closure(2), vec![2, 4, 5]);
    assert_eq!(sieve.closure(4), vec![4]);
}

#[test]
fn stratification_of_interpolated_triangle() {
    let mut sieve = Sieve::new();
    sieve.set_cone(0, &[1, 2, 3]);
    sieve.set_cone(1, &[4, 5]);
    sieve.set_cone(2, &[5, 6]);
    sieve.set_cone(3, &[6, 4]);
    let strata = sieve.stratify();

    assert_eq!(strata.depth_stratum(0), vec![4, 5, 6]);
    assert_eq!(strata.depth_stratum(1), vec![1, 2, 3]);
    assert_eq!(strata.depth_stratum(2), vec![0]);
    assert_eq!(strata.height_stratum(0), vec![0]);
    assert_eq!(strata.height_of(5), Some(2));
    assert_eq!(strata.depth(), 2);
    assert_eq!(strata.depth_of(42), None);
}

#[test]
fn base_and_cap_points() {
    let mut sieve = Sieve::new();
    sieve.set_cone(0, &[1, 2]);
    sieve.add_point(7);

    assert_eq!(sieve.base_points().collect::<Vec<_>>(), vec![0]);
    assert_eq!(sieve.cap_points().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(sieve.points().collect::<Vec<_>>(), vec![0, 1, 2, 7]);
    assert_eq!(sieve.num_points(), 4);
}

proptest! {
    #[test]
    fn set_cone_preserves_order(
        cone in btree_set(1usize..100, 1..8)
            .prop_map(|points| points.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    ) {
        let mut sieve = Sieve::new();
        sieve.set_cone(0, &cone);
        prop_assert_eq!(sieve.cone(0).collect::<Vec<_>>(), cone.clone());
        for p in cone {
            prop_assert_eq!(sieve.support(p).collect::<Vec<_>>(), vec![0]);
        }
    }
}

//! The four structural laws the tree must satisfy regardless of which
//! construction or mutation path produced it.

use nalgebra::Vector3;

use bvh_tree::shapes::Aabb3;
use bvh_tree::{BoundingVolume, Tree};

fn unit_box_at(x: f64, y: f64, z: f64) -> Aabb3<f64> {
    Aabb3::new(Vector3::new(x, y, z), Vector3::new(x + 1.0, y + 1.0, z + 1.0))
}

fn seeded_tree(n: u32) -> (Tree<Aabb3<f64>, u32>, Vec<(Aabb3<f64>, u32)>) {
    let mut tree = Tree::new();
    let mut seeds = Vec::new();
    for i in 0..n {
        let x = (i % 6) as f64 * 2.5;
        let y = (i / 6) as f64 * 2.5;
        let bv = unit_box_at(x, y, (i % 3) as f64);
        tree.insert(bv, i);
        seeds.push((bv, i));
    }
    (tree, seeds)
}

fn payloads_of(tree: &Tree<Aabb3<f64>, u32>) -> Vec<u32> {
    let mut ids = Vec::new();
    tree.extract_leaves(tree.root(), &mut ids);
    let mut payloads: Vec<u32> = ids.iter().map(|&id| tree.nodes().get(id).payload).collect();
    payloads.sort_unstable();
    payloads
}

#[test_log::test]
fn insert_remove_round_trip() {
    let (mut tree, _) = seeded_tree(10);
    let before_len = tree.len();
    let before_payloads = payloads_of(&tree);

    let new_leaf = tree.insert(unit_box_at(100.0, 100.0, 100.0), 999);
    assert_eq!(tree.len(), before_len + 1);

    tree.remove(new_leaf);
    assert_eq!(tree.len(), before_len);
    assert_eq!(payloads_of(&tree), before_payloads);
    tree.validate().expect("round-trip must leave a structurally valid tree");
}

#[test_log::test]
fn refit_is_idempotent() {
    let (mut tree, seeds) = seeded_tree(32);
    tree.balance_topdown();

    tree.refit();
    let mut once = Vec::new();
    collect_bvs(&tree, tree.root(), &mut once);

    tree.refit();
    let mut twice = Vec::new();
    collect_bvs(&tree, tree.root(), &mut twice);

    assert_eq!(once.len(), twice.len());
    for (a, b) in once.iter().zip(twice.iter()) {
        assert!(a.equal(b));
    }
    assert_eq!(payloads_of(&tree).len(), seeds.len());
}

fn collect_bvs(tree: &Tree<Aabb3<f64>, u32>, node: bvh_tree::NodeId, out: &mut Vec<Aabb3<f64>>) {
    if node == bvh_tree::NULL {
        return;
    }
    let record = tree.nodes().get(node);
    out.push(record.bv);
    if !record.is_leaf() {
        let children = record.children;
        collect_bvs(tree, children[0], out);
        collect_bvs(tree, children[1], out);
    }
}

#[test_log::test]
fn update_to_contained_bv_is_a_no_op() {
    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    let big = Aabb3::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 10.0, 10.0));
    let leaf = tree.insert(big, 1);
    tree.insert(unit_box_at(50.0, 50.0, 50.0), 2);

    let root_before = tree.root();
    let small = Aabb3::new(Vector3::new(1.0, 1.0, 1.0), Vector3::new(2.0, 2.0, 2.0));
    let changed = tree.update_bv(leaf, small);

    assert!(!changed);
    assert_eq!(tree.root(), root_before);
    assert!(tree.nodes().get(leaf).bv.equal(&big));
}

#[test_log::test]
fn rebuild_strategies_preserve_the_leaf_multiset() {
    let (mut tree, seeds) = seeded_tree(40);
    let mut expected: Vec<u32> = seeds.iter().map(|(_, p)| *p).collect();
    expected.sort_unstable();

    tree.balance_bottomup();
    tree.validate().expect("balance_bottomup must produce a valid tree");
    assert_eq!(payloads_of(&tree), expected);

    tree.balance_topdown();
    tree.validate().expect("balance_topdown must produce a valid tree");
    assert_eq!(payloads_of(&tree), expected);

    let leaves: Vec<(Aabb3<f64>, u32)> = seeds.clone();
    tree.init(leaves, 2);
    tree.refit();
    tree.validate().expect("init(level=2) + refit must produce a valid tree");
    assert_eq!(payloads_of(&tree), expected);

    let leaves: Vec<(Aabb3<f64>, u32)> = seeds.clone();
    tree.init(leaves, 3);
    tree.refit();
    tree.validate().expect("init(level=3) + refit must produce a valid tree");
    assert_eq!(payloads_of(&tree), expected);
}

#[test_log::test]
fn topdown_level_1_builds_a_valid_tree_over_a_mean_split() {
    let mut tree: Tree<Aabb3<f64>, u32> = Tree::with_params(4, 1);
    let mut leaves = Vec::new();
    for i in 0..40u32 {
        let x = (i % 8) as f64 * 3.0;
        let y = (i / 8) as f64 * 3.0;
        let z = (i % 5) as f64;
        leaves.push((unit_box_at(x, y, z), i));
    }
    let mut expected: Vec<u32> = leaves.iter().map(|(_, p)| *p).collect();
    expected.sort_unstable();

    tree.build_topdown(leaves);
    tree.validate().expect("topdown_level=1 build must produce a valid tree");
    assert_eq!(payloads_of(&tree), expected);
}

#[test_log::test]
fn velocity_and_margin_overloads_behave_like_update_bv() {
    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    let leaf = tree.insert(unit_box_at(0.0, 0.0, 0.0), 1);
    tree.insert(unit_box_at(20.0, 0.0, 0.0), 2);

    let velocity = Vector3::new(1.0, 0.0, 0.0);
    let moved = unit_box_at(5.0, 5.0, 5.0);
    assert!(tree.update_bv_with_velocity(leaf, moved, velocity));
    assert!(tree.nodes().get(leaf).bv.equal(&moved));
    tree.validate().expect("velocity overload must leave a valid tree");

    let moved_again = unit_box_at(10.0, 10.0, 10.0);
    let margin = 0.5;
    assert!(tree.update_bv_with_velocity_and_margin(leaf, moved_again, velocity, margin));
    assert!(tree.nodes().get(leaf).bv.equal(&moved_again));
    tree.validate().expect("velocity+margin overload must leave a valid tree");
}

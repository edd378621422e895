//! End-to-end scenarios S1-S6 from the tree's behavioural contract.

use nalgebra::Vector3;

use bvh_tree::shapes::Aabb3;
use bvh_tree::{BoundingVolume, NodeId, Tree, NULL};

fn unit_box_at(x: f64, y: f64, z: f64) -> Aabb3<f64> {
    Aabb3::new(Vector3::new(x, y, z), Vector3::new(x + 1.0, y + 1.0, z + 1.0))
}

#[test_log::test]
fn s1_empty_tree() {
    let tree: Tree<Aabb3<f64>, u32> = Tree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.root(), NULL);
    assert_eq!(tree.max_height(), 0);
}

#[test_log::test]
fn s2_single_leaf() {
    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    let leaf = tree.insert(unit_box_at(0.0, 0.0, 0.0), 1);
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.max_height(), 0);
    assert_eq!(tree.root(), leaf);
    assert_eq!(tree.nodes().get(tree.root()).parent, NULL);
}

#[test_log::test]
fn s3_four_disjoint_boxes() {
    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    tree.insert(unit_box_at(0.0, 0.0, 0.0), 1);
    tree.insert(unit_box_at(10.0, 0.0, 0.0), 2);
    tree.insert(unit_box_at(0.0, 10.0, 0.0), 3);
    tree.insert(unit_box_at(10.0, 10.0, 0.0), 4);

    assert_eq!(tree.len(), 4);
    assert!(tree.max_height() == 2 || tree.max_height() == 3);

    let root_bv = tree.nodes().get(tree.root()).bv;
    let expected = Aabb3::new(Vector3::new(0.0, 0.0, 0.0), Vector3::new(11.0, 11.0, 1.0));
    assert!(root_bv.equal(&expected));
    tree.validate().expect("tree must satisfy all invariants");
}

#[test_log::test]
fn s4_build_then_remove_all() {
    let boxes: Vec<Aabb3<f64>> = (0..8)
        .map(|i| unit_box_at((i * 3) as f64, (i % 3) as f64, 0.0))
        .collect();

    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    let leaves: Vec<(Aabb3<f64>, u32)> = boxes.into_iter().zip(1u32..).collect();
    tree.build_topdown(leaves);
    tree.validate().expect("freshly built tree must be valid");
    assert_eq!(tree.len(), 8);

    let all_leaves = {
        let mut out = Vec::new();
        tree.extract_leaves(tree.root(), &mut out);
        out
    };
    assert_eq!(all_leaves.len(), 8);

    for leaf in all_leaves {
        tree.remove(leaf);
        tree.validate().expect("invariants must hold after every removal");
    }
    assert!(tree.is_empty());
    assert_eq!(tree.root(), NULL);
}

#[test_log::test]
fn s5_morton_build_then_refit() {
    let boxes: Vec<(Aabb3<f64>, u32)> = (0..64u32)
        .map(|i| {
            let x = (i % 8) as f64 * 2.0;
            let y = (i / 8) as f64 * 2.0;
            (unit_box_at(x, y, 0.0), i)
        })
        .collect();

    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    let mut expected_payloads: Vec<u32> = boxes.iter().map(|(_, p)| *p).collect();
    expected_payloads.sort_unstable();

    tree.init(boxes, 1);
    tree.refit();
    tree.validate().expect("morton-built, refit tree must be valid");

    let mut leaf_ids = Vec::new();
    tree.extract_leaves(tree.root(), &mut leaf_ids);
    let mut payloads: Vec<u32> = leaf_ids.iter().map(|&id| tree.nodes().get(id).payload).collect();
    payloads.sort_unstable();
    assert_eq!(payloads, expected_payloads);

    for &id in &leaf_ids {
        let record = tree.nodes().get(id);
        assert!(record.is_leaf());
    }
    assert_subtree_bvs_are_exact_unions(&tree, tree.root());
}

fn assert_subtree_bvs_are_exact_unions(tree: &Tree<Aabb3<f64>, u32>, node: NodeId) {
    if node == NULL {
        return;
    }
    let record = tree.nodes().get(node);
    if record.is_leaf() {
        return;
    }
    let children = record.children;
    let left = tree.nodes().get(children[0]).bv;
    let right = tree.nodes().get(children[1]).bv;
    assert!(record.bv.equal(&left.union(&right)));
    assert_subtree_bvs_are_exact_unions(tree, children[0]);
    assert_subtree_bvs_are_exact_unions(tree, children[1]);
}

#[test_log::test]
fn s6_balance_incremental_preserves_payloads() {
    let mut tree: Tree<Aabb3<f64>, u32> = Tree::new();
    let mut expected: Vec<u32> = Vec::new();
    for i in 0..20u32 {
        let x = (i % 5) as f64 * 3.0;
        let y = (i / 5) as f64 * 3.0;
        tree.insert(unit_box_at(x, y, 0.0), i);
        expected.push(i);
    }
    expected.sort_unstable();

    let n = tree.len() as i32;
    tree.balance_incremental(n);
    tree.validate().expect("invariants must hold after balance_incremental");

    let mut leaf_ids = Vec::new();
    tree.extract_leaves(tree.root(), &mut leaf_ids);
    let mut payloads: Vec<u32> = leaf_ids.iter().map(|&id| tree.nodes().get(id).payload).collect();
    payloads.sort_unstable();
    assert_eq!(payloads, expected);
}

//! Demo dataset
//!
//! A fixed animal taxonomy with explicit identifiers, loaded by
//! `TreeService::seed` to reset the tree to a known state.

use crate::models::NewNode;

/// `(id, name, parent_id)` rows of the demo taxonomy, parents before children
pub const ANIMAL_TAXONOMY: [(i64, &str, Option<i64>); 38] = [
    (1, "Animals", None),
    (2, "Mammals", Some(1)),
    (3, "Birds", Some(1)),
    (4, "Fish", Some(1)),
    (5, "Reptiles", Some(1)),
    (6, "Invertebrates", Some(1)),
    (7, "Amphibians", Some(1)),
    (8, "frogs", Some(7)),
    (9, "newts", Some(7)),
    (10, "salamanders", Some(7)),
    (11, "toads", Some(7)),
    (12, "albatrosses", Some(3)),
    (13, "chickens", Some(3)),
    (14, "falcons", Some(3)),
    (15, "owls", Some(3)),
    (16, "parrots", Some(3)),
    (17, "penguins", Some(3)),
    (18, "eels", Some(4)),
    (19, "salmon", Some(4)),
    (20, "seahorses", Some(4)),
    (21, "elephants", Some(2)),
    (22, "hamsters", Some(2)),
    (23, "rabbits", Some(2)),
    (24, "rhinoceroses", Some(2)),
    (25, "whales", Some(2)),
    (26, "crocodiles", Some(5)),
    (27, "snakes", Some(5)),
    (28, "tortoises", Some(5)),
    (29, "arthropoda", Some(6)),
    (30, "nematoda", Some(6)),
    (31, "mollusca", Some(6)),
    (32, "clams", Some(31)),
    (33, "roundworms", Some(30)),
    (34, "spiders", Some(29)),
    (35, "cockatiels", Some(16)),
    (36, "amazons", Some(16)),
    (37, "macaws", Some(16)),
    (38, "dogs", Some(2)),
];

/// The taxonomy as insertable nodes
pub fn animal_taxonomy() -> Vec<NewNode> {
    ANIMAL_TAXONOMY
        .iter()
        .map(|&(id, name, parent_id)| NewNode {
            id: Some(id),
            name: name.to_string(),
            parent_id,
        })
        .collect()
}

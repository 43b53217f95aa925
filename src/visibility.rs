//! Layer visibility resolution
//!
//! A group is hidden when it is marked invisible or any ancestor group is.
//! Parents may appear before or after their children in the layer list, so
//! each group's ancestor chain is walked through an id index built once per
//! call. A `parent_id` that names no group ends the chain (fails open).

use std::collections::{HashMap, HashSet};

use crate::layer::{Drawable, Group, Layer, LayerId};

fn group_index(layers: &[Layer]) -> HashMap<LayerId, &Group> {
    layers
        .iter()
        .filter_map(Layer::as_group)
        .map(|g| (g.id, g))
        .collect()
}

/// Ids of every group that is hidden, directly or through an ancestor
pub fn hidden_group_ids(layers: &[Layer]) -> HashSet<LayerId> {
    let groups = group_index(layers);
    let mut resolved: HashMap<LayerId, bool> = HashMap::with_capacity(groups.len());
    let mut chain: Vec<LayerId> = Vec::new();

    for group in layers.iter().filter_map(Layer::as_group) {
        if resolved.contains_key(&group.id) {
            continue;
        }

        chain.clear();
        let mut hidden = false;
        let mut cursor = Some(group);

        while let Some(g) = cursor {
            if let Some(&known) = resolved.get(&g.id) {
                hidden = known;
                break;
            }
            // Cycle guard
            if chain.contains(&g.id) {
                break;
            }
            chain.push(g.id);
            if !g.visible {
                hidden = true;
                break;
            }
            cursor = g.parent_id.and_then(|pid| groups.get(&pid).copied());
        }

        // Every group in the walked chain descends from where the walk
        // stopped, so it inherits that answer.
        for id in &chain {
            resolved.insert(*id, hidden);
        }
    }

    resolved
        .into_iter()
        .filter_map(|(id, hidden)| hidden.then_some(id))
        .collect()
}

/// Drawable layers that are visible themselves and have no hidden
/// ancestor, in their original z-order.
///
/// Only groups gate visibility: a `parent_id` naming a drawable is ignored
/// along with anything above it, so such a layer is shown.
pub fn visible_drawable_layers(layers: &[Layer]) -> Vec<&Drawable> {
    let hidden = hidden_group_ids(layers);
    layers
        .iter()
        .filter_map(Layer::as_drawable)
        .filter(|d| d.visible)
        // hidden is transitively closed, so the direct parent decides
        .filter(|d| !matches!(d.parent_id, Some(pid) if hidden.contains(&pid)))
        .collect()
}

//! Emission order for complete structs.

use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::{Items, ValidationError};

/// Orders `items.structs` so that every struct comes after the structs it
/// stores by value (directly or inside arrays).
///
/// Among the structs whose dependencies are already placed, the earliest
/// declared goes first, so a description that is already ordered keeps its
/// order. Returns indices into `items.structs`.
pub fn struct_order(items: &Items) -> Result<Vec<usize>, ValidationError> {
    let deps = by_value_deps(items);
    let count = deps.len();

    let mut placed = vec![false; count];
    let mut order = Vec::with_capacity(count);

    while order.len() < count {
        let ready = (0..count).find(|&i| !placed[i] && deps[i].iter().all(|&d| placed[d]));
        let Some(next) = ready else {
            let name = items.structs[on_cycle(&deps, &placed)].name.clone();
            return Err(ValidationError::Cycle { name });
        };
        placed[next] = true;
        order.push(next);
    }

    log::trace!("struct order: {order:?}");
    Ok(order)
}

/// For each struct, the indices of the complete structs it embeds.
fn by_value_deps(items: &Items) -> Vec<Vec<usize>> {
    let mut index = BTreeMap::new();
    for (i, s) in items.structs.iter().enumerate() {
        index.entry(s.name.as_str()).or_insert(i);
    }

    items
        .structs
        .iter()
        .map(|s| {
            let mut deps: Vec<usize> = s
                .fields
                .iter()
                .filter_map(|field| field.ty.by_value_name())
                .filter_map(|name| index.get(name).copied())
                .collect();
            deps.sort_unstable();
            deps.dedup();
            deps
        })
        .collect()
}

/// Finds a struct that lies on a cycle among the unplaced ones.
///
/// Every unplaced struct waits on at least one other unplaced struct, so
/// following those edges must revisit a node.
fn on_cycle(deps: &[Vec<usize>], placed: &[bool]) -> usize {
    let mut seen = vec![false; deps.len()];
    let mut at = placed.iter().position(|&p| !p).unwrap_or_default();
    loop {
        if seen[at] {
            return at;
        }
        seen[at] = true;
        match deps[at].iter().copied().find(|&d| !placed[d]) {
            Some(next) => at = next,
            None => return at,
        }
    }
}

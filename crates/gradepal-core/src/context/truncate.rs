//! List capping with an explicit omission marker.

/// Keep at most `max` items; when anything is dropped, append one trailing
/// entry `…and N more` so the reader knows the list is incomplete.
pub fn cap_list(mut items: Vec<String>, max: usize) -> Vec<String> {
    if items.len() <= max {
        return items;
    }
    let omitted = items.len() - max;
    items.truncate(max);
    items.push(format!("…and {omitted} more"));
    items
}

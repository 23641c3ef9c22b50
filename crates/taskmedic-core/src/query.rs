use std::cmp::Ordering;

use tracing::trace;

use crate::item::{Item, Preferences, SortMode, StatusFilter, Urgency};

pub fn rank_urgency(urgency: Urgency) -> u8 {
    match urgency {
        Urgency::Red => 0,
        Urgency::Amber => 1,
        Urgency::Green => 2,
    }
}

#[tracing::instrument(skip(items, prefs), fields(total = items.len()))]
pub fn select_visible<'a>(items: &'a [Item], prefs: &Preferences) -> Vec<&'a Item> {
    let query = prefs.search.trim().to_lowercase();

    let visible: Vec<&Item> = items
        .iter()
        .filter(|item| {
            if !prefs.kind.admits(item.item_type()) {
                return false;
            }
            match prefs.filter {
                StatusFilter::Open if item.done => return false,
                StatusFilter::Done if !item.done => return false,
                _ => {}
            }
            query.is_empty() || search_blob(item).contains(&query)
        })
        .collect();

    trace!(visible = visible.len(), "selected visible items");
    visible
}

pub fn sort_items<'a>(items: &[&'a Item], mode: SortMode) -> Vec<&'a Item> {
    let mut list = items.to_vec();
    match mode {
        SortMode::Newest => list.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortMode::Triage => list.sort_by(|a, b| triage_cmp(a, b)),
    }
    list
}

/// Open before done, then urgency, then earliest review-by (unset last),
/// then oldest first.
pub fn triage_cmp(a: &Item, b: &Item) -> Ordering {
    a.done
        .cmp(&b.done)
        .then_with(|| rank_urgency(a.urgency).cmp(&rank_urgency(b.urgency)))
        .then_with(|| match (a.review_by, b.review_by) {
            (Some(ra), Some(rb)) => ra.cmp(&rb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// The `n` most pressing open items, ranked with [`triage_cmp`].
pub fn top_triage(items: &[Item], n: usize) -> Vec<&Item> {
    let open: Vec<&Item> = items.iter().filter(|item| !item.done).collect();
    let mut ranked = sort_items(&open, SortMode::Triage);
    ranked.truncate(n);
    ranked
}

pub fn visible_sorted<'a>(items: &'a [Item], prefs: &Preferences) -> Vec<&'a Item> {
    sort_items(&select_visible(items, prefs), prefs.sort)
}

fn search_blob(item: &Item) -> String {
    match serde_json::to_string(item) {
        Ok(blob) => blob.to_lowercase(),
        Err(err) => {
            tracing::warn!(id = %item.id, error = %err, "failed serializing item for search");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::checklist::add_entry;
    use crate::item::{BleepDetails, ItemKind, JobDetails, KindFilter};

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).single().expect("valid millis")
    }

    fn job(summary: &str, created: i64) -> Item {
        Item::new(
            ItemKind::Job(JobDetails {
                summary: summary.to_string(),
                ..JobDetails::default()
            }),
            at(created),
        )
    }

    fn bleep(from: &str, created: i64) -> Item {
        Item::new(
            ItemKind::Bleep(BleepDetails {
                from: from.to_string(),
                ..BleepDetails::default()
            }),
            at(created),
        )
    }

    fn ids(items: &[&Item]) -> Vec<String> {
        items.iter().map(|item| item.id.clone()).collect()
    }

    fn all_prefs() -> Preferences {
        Preferences {
            filter: StatusFilter::All,
            ..Preferences::default()
        }
    }

    #[test]
    fn triage_orders_done_urgency_review_then_age() {
        let mut done_red = job("done red", 1);
        done_red.urgency = Urgency::Red;
        done_red.done = true;

        let mut green = job("green", 2);
        green.urgency = Urgency::Green;

        let mut amber_late_review = job("amber late", 3);
        amber_late_review.review_by = Some(at(50_000));

        let mut amber_early_review = job("amber early", 4);
        amber_early_review.review_by = Some(at(10_000));

        let amber_no_review_old = job("amber none old", 5);
        let amber_no_review_new = job("amber none new", 6);

        let mut red = job("red", 7);
        red.urgency = Urgency::Red;

        let items = vec![
            done_red.clone(),
            green.clone(),
            amber_no_review_new.clone(),
            amber_late_review.clone(),
            red.clone(),
            amber_no_review_old.clone(),
            amber_early_review.clone(),
        ];
        let refs: Vec<&Item> = items.iter().collect();
        let sorted = sort_items(&refs, SortMode::Triage);

        assert_eq!(
            ids(&sorted),
            vec![
                red.id,
                amber_early_review.id,
                amber_late_review.id,
                amber_no_review_old.id,
                amber_no_review_new.id,
                green.id,
                done_red.id,
            ]
        );
    }

    #[test]
    fn unset_review_by_sorts_after_set_review_by() {
        let unset = job("unset", 1);
        let mut set = job("set", 2);
        set.review_by = Some(at(99_999_999));

        let items = [unset.clone(), set.clone()];
        let refs: Vec<&Item> = items.iter().collect();
        assert_eq!(ids(&sort_items(&refs, SortMode::Triage)), vec![set.id, unset.id]);
    }

    #[test]
    fn newest_sorts_by_creation_descending() {
        let items = [job("a", 1), job("b", 3), job("c", 2)];
        let refs: Vec<&Item> = items.iter().collect();
        let sorted = sort_items(&refs, SortMode::Newest);
        assert_eq!(
            sorted.iter().map(|it| it.created_at).collect::<Vec<_>>(),
            vec![at(3), at(2), at(1)]
        );
    }

    #[test]
    fn kind_and_status_filters_apply() {
        let mut done_job = job("done", 1);
        done_job.done = true;
        let items = vec![job("open", 2), done_job, bleep("x5678", 3)];

        let jobs_only = Preferences {
            kind: KindFilter::Job,
            ..all_prefs()
        };
        assert!(
            select_visible(&items, &jobs_only)
                .iter()
                .all(|item| matches!(item.kind, ItemKind::Job(_)))
        );

        let open_only = Preferences::default();
        let open = select_visible(&items, &open_only);
        assert_eq!(open.len(), 2);
        assert!(open.iter().all(|item| !item.done));
    }

    #[test]
    fn search_is_case_insensitive_and_reaches_nested_text() {
        let mut with_task = job("Chest pain", 1);
        with_task.tasks = add_entry(&[], "Repeat TROPONIN", at(2));
        let items = vec![with_task.clone(), job("Falls review", 3)];

        let prefs = Preferences {
            search: "  troponin ".to_string(),
            ..all_prefs()
        };
        assert_eq!(ids(&select_visible(&items, &prefs)), vec![with_task.id]);
    }

    #[test]
    fn searching_bleep_finds_only_the_bleep_item() {
        let target = bleep("Bleep 1234", 1);
        let items = vec![job("Sepsis - improving", 2), target.clone()];

        let prefs = Preferences {
            search: "bleep".to_string(),
            ..all_prefs()
        };
        assert_eq!(ids(&select_visible(&items, &prefs)), vec![target.id]);
    }

    #[test]
    fn top_triage_matches_the_head_of_the_full_sort() {
        let mut items = Vec::new();
        for (idx, urgency) in [Urgency::Green, Urgency::Red, Urgency::Amber, Urgency::Red]
            .into_iter()
            .enumerate()
        {
            let mut it = job(&format!("job {idx}"), idx as i64);
            it.urgency = urgency;
            items.push(it);
        }
        items[1].done = true;

        let open: Vec<&Item> = items.iter().filter(|it| !it.done).collect();
        let full = sort_items(&open, SortMode::Triage);
        assert_eq!(ids(&top_triage(&items, 3)), ids(&full[..3]));
    }
}

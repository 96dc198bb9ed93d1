//! Visibility and ownership policy.
//!
//! Pure decision functions over already-loaded data: no I/O, no clock reads.
//! Handlers apply these to gate detail views and mutations; the repository
//! layer reproduces the same predicates declaratively in its list queries.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post};

/// Whether `post` appears in public listings at instant `now`.
///
/// A post is publicly visible when it is published, its publication time has
/// passed, and its category (if it has one) is itself published.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_none_or(|c| c.is_published)
}

/// Whether `viewer` may open the detail view of `post`.
///
/// The author always may, regardless of publication state. Anyone else sees
/// only publicly visible posts; a `false` here must surface as "not found",
/// indistinguishable from a post that does not exist.
pub fn can_view_detail(
    post: &Post,
    category: Option<&Category>,
    viewer: Option<Uuid>,
    now: DateTime<Utc>,
) -> bool {
    viewer == Some(post.author_id) || is_publicly_visible(post, category, now)
}

/// Whether `actor` may edit or delete an item owned by `owner`.
///
/// A `false` result is a soft redirect back to the item's detail view, not an
/// authorization error.
pub fn can_mutate(owner: Uuid, actor: Uuid) -> bool {
    owner == actor
}

/// Pair each post with its comment count, preserving the input order.
///
/// `counts` maps post id to persisted comment count; posts without an entry
/// get zero. Listing order (newest `pub_date` first for index and category
/// pages, the caller's chosen order elsewhere) is decided before this call
/// and flows through untouched.
pub fn annotate_comment_count(
    posts: Vec<Post>,
    counts: &HashMap<Uuid, u64>,
) -> Vec<(Post, u64)> {
    posts
        .into_iter()
        .map(|post| {
            let count = counts.get(&post.id).copied().unwrap_or(0);
            (post, count)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn sample_post(author: Uuid, pub_date: DateTime<Utc>, published: bool) -> Post {
        let mut post = Post::new(author, "title".into(), "text".into(), pub_date);
        post.is_published = published;
        post
    }

    fn sample_category(published: bool) -> Category {
        let mut category = Category::new("Travel".into(), "desc".into(), "travel".into());
        category.is_published = published;
        category
    }

    #[test]
    fn published_past_post_without_category_is_visible() {
        let now = Utc::now();
        let post = sample_post(Uuid::new_v4(), now - TimeDelta::days(1), true);

        assert!(is_publicly_visible(&post, None, now));
    }

    #[test]
    fn future_dated_post_is_hidden() {
        let now = Utc::now();
        let post = sample_post(Uuid::new_v4(), now + TimeDelta::days(1), true);

        assert!(!is_publicly_visible(&post, None, now));
    }

    #[test]
    fn unpublished_post_is_hidden() {
        let now = Utc::now();
        let post = sample_post(Uuid::new_v4(), now - TimeDelta::days(1), false);

        assert!(!is_publicly_visible(&post, None, now));
    }

    #[test]
    fn post_in_unpublished_category_is_hidden() {
        let now = Utc::now();
        let post = sample_post(Uuid::new_v4(), now - TimeDelta::days(1), true);
        let hidden = sample_category(false);
        let shown = sample_category(true);

        assert!(!is_publicly_visible(&post, Some(&hidden), now));
        assert!(is_publicly_visible(&post, Some(&shown), now));
    }

    #[test]
    fn author_can_view_own_hidden_post() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let post = sample_post(author, now + TimeDelta::days(7), false);

        assert!(can_view_detail(&post, None, Some(author), now));
    }

    #[test]
    fn stranger_and_anonymous_cannot_view_hidden_post() {
        let now = Utc::now();
        let post = sample_post(Uuid::new_v4(), now, false);

        assert!(!can_view_detail(&post, None, Some(Uuid::new_v4()), now));
        assert!(!can_view_detail(&post, None, None, now));
    }

    #[test]
    fn anyone_can_view_visible_post() {
        let now = Utc::now();
        let post = sample_post(Uuid::new_v4(), now - TimeDelta::hours(1), true);

        assert!(can_view_detail(&post, None, None, now));
        assert!(can_view_detail(&post, None, Some(Uuid::new_v4()), now));
    }

    #[test]
    fn only_owner_can_mutate() {
        let owner = Uuid::new_v4();

        assert!(can_mutate(owner, owner));
        assert!(!can_mutate(owner, Uuid::new_v4()));
    }

    #[test]
    fn annotation_preserves_order_and_defaults_to_zero() {
        let now = Utc::now();
        let a = sample_post(Uuid::new_v4(), now, true);
        let b = sample_post(Uuid::new_v4(), now, true);
        let c = sample_post(Uuid::new_v4(), now, true);

        let mut counts = HashMap::new();
        counts.insert(a.id, 3);
        counts.insert(c.id, 1);

        let ids = vec![a.id, b.id, c.id];
        let annotated = annotate_comment_count(vec![a, b, c], &counts);

        let got_ids: Vec<_> = annotated.iter().map(|(p, _)| p.id).collect();
        let got_counts: Vec<_> = annotated.iter().map(|(_, n)| *n).collect();
        assert_eq!(got_ids, ids);
        assert_eq!(got_counts, vec![3, 0, 1]);
    }
}

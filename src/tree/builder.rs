//! Builds a [`ThreadTree`] from one `getPostThread` payload

use crate::api::types::{ThreadNode, ThreadViewPost};
use crate::post::Post;
use crate::tree::{ThreadTree, Truncation};
use std::collections::HashSet;

/// Flattens a nested thread payload into a tree
///
/// Traversal is depth-first pre-order, replies in server order. Blocked,
/// not-found and unknown nodes are skipped together with their subtrees, and
/// a URI seen twice within the payload is only taken once. Every post whose
/// reported reply count is larger than the number of reply entries returned
/// yields a [`Truncation`].
///
/// A payload whose root is not a viewable post produces an empty tree.
pub fn build_thread_tree(root: &ThreadNode) -> ThreadTree {
    let ThreadNode::Post(root_view) = root else {
        return ThreadTree::default();
    };

    let mut posts = Vec::new();
    let mut truncated = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(&ThreadViewPost, u32, Option<&str>)> = vec![(root_view, 0, None)];

    while let Some((node, depth, parent)) = stack.pop() {
        let uri = node.post.uri.as_str();
        if !seen.insert(uri) {
            tracing::trace!("skipping duplicate {} within payload", uri);
            continue;
        }

        let post = Post::from_view(&node.post, depth, parent);

        let actual_replies = node.replies.len() as u32;
        if post.reply_count > actual_replies {
            truncated.push(Truncation {
                uri: uri.to_string(),
                expected_replies: post.reply_count,
                actual_replies,
            });
        }

        // Reversed so the first reply is popped first
        for reply in node.replies.iter().rev() {
            match reply {
                ThreadNode::Post(child) => stack.push((child, depth + 1, Some(uri))),
                other => tracing::trace!(
                    "skipping unviewable reply {} under {}",
                    other.uri().unwrap_or("<unknown>"),
                    uri
                ),
            }
        }

        posts.push(post);
    }

    tracing::trace!(
        "built tree for {}: {} posts, {} truncated",
        root_view.post.uri,
        posts.len(),
        truncated.len()
    );

    ThreadTree::from_posts(Some(root_view.post.uri.clone()), posts).with_truncations(truncated)
}

// SPDX-License-Identifier: Apache-2.0

//! Resume command: republish parked posts whose windows have reopened.

use postgram_core::{ContainerApi, MediaPublisher};

use crate::commands::types::ResumeResult;

/// Run the resume command - one pass over the due pending entries.
pub async fn run<A: ContainerApi>(publisher: &mut MediaPublisher<A>) -> ResumeResult {
    let before = publisher.stats();
    let due = publisher
        .pending_posts()
        .iter()
        .filter(|post| post.next_attempt_in_secs == 0)
        .count();

    publisher.resume_pending().await;

    let after = publisher.stats();
    ResumeResult {
        due,
        published: after.successful_posts - before.successful_posts,
        remaining: publisher.pending_posts().len(),
        stats: after,
    }
}

//! Memoisation of the last render.

use std::sync::Arc;

use super::{RenderOutput, RenderRequest, render};

/// Remembers the last request and its output.
///
/// A request is a hit when its block array is the same allocation as last
/// time and everything else compares equal. A changed array is always a miss,
/// even with equal contents; callers replace the array on every edit.
#[derive(Debug, Default)]
pub struct RenderCache {
    last: Option<(RenderRequest, RenderOutput)>,
    hits: u64,
    misses: u64,
}

fn same_inputs(a: &RenderRequest, b: &RenderRequest) -> bool {
    Arc::ptr_eq(&a.blocks, &b.blocks)
        && a.mode == b.mode
        && a.composition_name == b.composition_name
        && a.frontmatter == b.frontmatter
        && a.email_container == b.email_container
        && a.stylesheet == b.stylesheet
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, request: &RenderRequest) -> &RenderOutput {
        let hit = matches!(&self.last, Some((previous, _)) if same_inputs(previous, request));
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
            self.last = None;
        }
        let (_, output) = self
            .last
            .get_or_insert_with(|| (request.clone(), render(request)));
        output
    }

    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

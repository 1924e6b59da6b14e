use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::{Classification, Comment, CommentClass};

static TASK_ANCHOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(todo|fixme|xxx|hack)(:|\s)").unwrap());

/// Flags task comments. A line starting with a task keyword opens a task;
/// following lines belong to it until one ends with a period.
pub struct TaskCommentMatcher;

impl TaskCommentMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, comment: &Comment) -> Vec<Classification> {
        let lines = comment.sanitized_lines();
        let mut task_lines = Vec::new();
        let mut in_task = false;
        for (i, line) in lines.iter().enumerate() {
            if TASK_ANCHOR.is_match(&line.text) {
                in_task = true;
            }
            if in_task {
                task_lines.push(i);
                if line.text.trim_end().ends_with('.') {
                    in_task = false;
                }
            }
        }
        if task_lines.is_empty() {
            return Vec::new();
        }
        if task_lines.len() == lines.len() {
            return vec![Classification::whole(CommentClass::Task)];
        }
        vec![Classification::partial(CommentClass::Task, task_lines)]
    }
}

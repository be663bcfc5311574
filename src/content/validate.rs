//! Authoring checks for content inputs
//!
//! Problems are collected rather than short-circuited so the editor can show
//! every field error at once.

use crate::content::types::*;
use crate::error::{Error, Result};
use crate::locale::LocalizedText;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn slug_pattern() -> &'static Regex {
    static SLUG: OnceLock<Regex> = OnceLock::new();
    SLUG.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex"))
}

fn icon_pattern() -> &'static Regex {
    static ICON: OnceLock<Regex> = OnceLock::new();
    ICON.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("valid icon regex"))
}

/// Accumulates validation problems for one input
#[derive(Debug, Default)]
pub struct Problems(Vec<String>);

impl Problems {
    pub fn push(&mut self, problem: impl Into<String>) {
        self.0.push(problem.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert into `Ok(())` or a validation error naming `what`
    pub fn finish(self, what: &str) -> Result<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(Error::Validation {
            message: format!("{} is invalid ({} problem(s))", what, self.0.len()),
            details: self.0,
        })
    }
}

pub fn check_name(problems: &mut Problems, field: &str, text: &LocalizedText) {
    if text.en.trim().is_empty() {
        problems.push(format!("{}.en must not be empty", field));
    }
}

pub fn check_icon(problems: &mut Problems, icon: &str) {
    if !icon_pattern().is_match(icon) {
        problems.push(format!("icon '{}' is not a valid icon name", icon));
    }
}

pub fn check_slug(problems: &mut Problems, slug: &str) {
    if !slug_pattern().is_match(slug) {
        problems.push(format!(
            "slug '{}' must be lowercase words separated by hyphens",
            slug
        ));
    }
}

pub fn validate_box(input: &BoxInput) -> Result<()> {
    let mut problems = Problems::default();
    check_name(&mut problems, "name", &input.name);
    check_icon(&mut problems, &input.icon);
    problems.finish("box")
}

pub fn validate_task(input: &TaskInput) -> Result<()> {
    let mut problems = Problems::default();
    check_name(&mut problems, "name", &input.name);
    check_icon(&mut problems, &input.icon);
    check_blocks(&mut problems, &input.blocks);
    problems.finish("task")
}

pub fn validate_document(input: &DocumentInput) -> Result<()> {
    let mut problems = Problems::default();
    check_slug(&mut problems, &input.slug);
    check_name(&mut problems, "title", &input.title);
    problems.finish("document")
}

fn check_blocks(problems: &mut Problems, blocks: &[Block]) {
    let mut ids = HashSet::new();
    for (index, block) in blocks.iter().enumerate() {
        if block.id.trim().is_empty() {
            problems.push(format!("blocks[{}].id must not be empty", index));
        } else if !ids.insert(block.id.as_str()) {
            problems.push(format!("block id '{}' is duplicated", block.id));
        }

        match &block.kind {
            BlockKind::Markdown { .. } => {
                if block.required {
                    problems.push(format!("markdown block '{}' cannot be required", block.id));
                }
            }
            BlockKind::Text { label, .. } => {
                check_name(problems, &format!("blocks[{}].label", index), label);
            }
            BlockKind::Number { label, min, max, .. } => {
                check_name(problems, &format!("blocks[{}].label", index), label);
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        problems.push(format!("block '{}' has min greater than max", block.id));
                    }
                }
            }
            BlockKind::Select { label, options, .. } => {
                check_name(problems, &format!("blocks[{}].label", index), label);
                if options.is_empty() {
                    problems.push(format!("select block '{}' needs at least one option", block.id));
                }
                let mut values = HashSet::new();
                for option in options {
                    if option.value.trim().is_empty() {
                        problems.push(format!("select block '{}' has an empty option value", block.id));
                    } else if !values.insert(option.value.as_str()) {
                        problems.push(format!(
                            "select block '{}' repeats option '{}'",
                            block.id, option.value
                        ));
                    }
                }
            }
        }
    }
}

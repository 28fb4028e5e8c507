//! Aiken text export.
//!
//! Each question is written as:
//!
//! ```text
//! What does `&mut` grant?
//! A. Shared access
//! B. Exclusive access
//! C. Ownership
//! D. Nothing
//! ANSWER: B
//! ```
//!
//! followed by a blank line.

use crate::modules::content::model::ItemContent;

const RULE_WIDTH: usize = 50;

/// Exam items of one module, in export order.
#[derive(Debug, Clone)]
pub struct AikenModule {
    pub position: i32,
    pub title: String,
    pub items: Vec<ItemContent>,
}

fn push_item(lines: &mut Vec<String>, item: &ItemContent) {
    lines.push(item.question.trim().to_string());
    lines.push(format!("A. {}", item.option_a.trim()));
    lines.push(format!("B. {}", item.option_b.trim()));
    lines.push(format!("C. {}", item.option_c.trim()));
    lines.push(format!("D. {}", item.option_d.trim()));
    lines.push(format!("ANSWER: {}", item.correct_answer.trim()));
    lines.push(String::new());
}

pub fn render_module(items: &[ItemContent]) -> String {
    if items.is_empty() {
        return "No exam items found for this module.".to_string();
    }

    let mut lines = Vec::with_capacity(items.len() * 7);
    for item in items {
        push_item(&mut lines, item);
    }
    lines.join("\n")
}

/// Renders every module that has items, each under a ruled header.
pub fn render_course(modules: &[AikenModule]) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut lines = Vec::new();

    for module in modules.iter().filter(|m| !m.items.is_empty()) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(rule.clone());
        lines.push(format!("MODULE {}: {}", module.position, module.title));
        lines.push(rule.clone());
        lines.push(String::new());

        for item in &module.items {
            push_item(&mut lines, item);
        }
    }

    if lines.is_empty() {
        return "No exam items found for this course.".to_string();
    }
    lines.join("\n")
}

pub fn module_filename(course_code: &str, position: i32) -> String {
    format!("{}_Module_{}_Aiken_Format.txt", course_code, position)
}

pub fn course_filename(course_code: &str) -> String {
    format!("{}_All_Modules_Aiken_Format.txt", course_code)
}

//! Prompt builders, output validators and canned fallbacks for every
//! generation task.
//!
//! Everything here is pure so that each cascade can be tested without a
//! database. Validators return `None` for output that should be retried.

use serde_json::Value;

use lms_core::text::collapse_whitespace;

use crate::llm::parse::{
    extract_json_object, parse_json_array, parse_lenient, regex_field, strip_control_chars,
    strip_known_prefixes, fix_code_blocks,
};
use crate::modules::ai::model::{ActivityKind, Difficulty, GeneratedActivity, GeneratedModule, GradeSuggestion};
use crate::modules::content::model::ItemContent;

pub const DEFAULT_MODULE_COUNT: u32 = 6;
pub const MIN_MODULE_COUNT: u32 = 3;
pub const MAX_MODULE_COUNT: u32 = 12;

pub const CHUNK_CHARS: usize = 800;
const MIN_CHUNK_CHARS: usize = 50;
const MIN_ITEMS_PER_CHUNK: usize = 3;
const FALLBACK_ITEM_COUNT: usize = 5;

const MIN_DESCRIPTION_CHARS: usize = 10;
pub const MIN_SECTION_CONTENT_CHARS: usize = 50;

pub const FALLBACK_GRADE: f64 = 75.0;

// Course structure

pub fn suggest_count_prompt(course_title: &str, course_description: &str) -> String {
    format!(
        "Based on this course information:\nTitle: {course_title}\nDescription: {course_description}\n\n\
         Suggest the optimal number of modules for this course. Consider the scope and complexity \
         of the content. Respond with ONLY a number between {MIN_MODULE_COUNT} and {MAX_MODULE_COUNT}."
    )
}

/// First integer in the reply, if it is a sensible module count.
pub fn parse_module_count(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .and_then(|digits| digits.parse::<u32>().ok())
        .filter(|n| (MIN_MODULE_COUNT..=MAX_MODULE_COUNT).contains(n))
}

pub fn modules_prompt(
    course_title: &str,
    course_description: &str,
    count: u32,
    existing: &[(String, String)],
) -> String {
    let mut prompt = format!(
        "Create {count} course modules for:\nCourse: {course_title}\nDescription: {course_description}\n\n"
    );

    if !existing.is_empty() {
        prompt.push_str("Existing modules to avoid overlap:\n");
        for (i, (title, description)) in existing.iter().enumerate() {
            prompt.push_str(&format!("{}. {}: {}\n", i + 1, title, description));
        }
        prompt.push('\n');
    }

    prompt.push_str(
        "For each module, provide:\n1. A clear, descriptive title\n\
         2. A comprehensive description (2-3 sentences)\n\n\
         Format as JSON array:\n[{\"title\": \"Module Title\", \"description\": \"Module description...\"}]\n\n\
         Respond with ONLY the JSON array, no other text.",
    );
    prompt
}

pub fn modules_retry_prompt(course_title: &str, course_description: &str, count: u32) -> String {
    format!(
        "Create exactly {count} modules for: {course_title}\n\nCourse Description: {course_description}\n\n\
         You MUST return a valid JSON array with {count} objects. Each object must have \"title\" and \
         \"description\" fields.\n\nMake the titles and descriptions specific to {course_title}. \
         Return ONLY the JSON array."
    )
}

/// Accepts exactly `count` modules, each with a title.
pub fn parse_modules(text: &str, count: u32) -> Option<Vec<GeneratedModule>> {
    let modules: Vec<GeneratedModule> = parse_json_array::<GeneratedModule>(text)?
        .into_iter()
        .map(|m| GeneratedModule {
            title: collapse_whitespace(&m.title),
            description: collapse_whitespace(&m.description),
        })
        .collect();

    let complete = modules.iter().all(|m| !m.title.is_empty());
    (complete && modules.len() == count as usize).then_some(modules)
}

pub fn fallback_modules(course_title: &str, count: u32) -> Vec<GeneratedModule> {
    (1..=count)
        .map(|i| GeneratedModule {
            title: if i <= 4 {
                format!("Module {i}: {course_title} - Part {i}")
            } else {
                format!("Module {i}: {course_title} - Advanced Topics {i}")
            },
            description: format!(
                "This module covers important concepts and topics related to {course_title}. \
                 Students will learn key principles and practical applications."
            ),
        })
        .collect()
}

pub fn description_prompt(
    module_title: &str,
    course_title: &str,
    course_description: &str,
    other_modules: &[String],
) -> String {
    let others = if other_modules.is_empty() {
        "None".to_string()
    } else {
        other_modules.join(", ")
    };

    format!(
        "Generate ONLY a module description for: \"{module_title}\"\n\n\
         Course: {course_title}\nCourse Description: {course_description}\n\
         Other Existing Modules: {others}\n\n\
         Requirements:\n\
         - Write 2-3 sentences describing what students will learn in this module\n\
         - Be specific to \"{module_title}\" and do not repeat the other modules\n\
         - Do not repeat the module title\n\
         - Return only the description text\n\n\
         Description:"
    )
}

/// Drops echoed title lines and a leading label, then joins what is left.
pub fn clean_description(text: &str, module_title: &str) -> Option<String> {
    let title = module_title.trim().to_lowercase();
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| title.is_empty() || !line.to_lowercase().starts_with(&title))
        .collect::<Vec<_>>()
        .join(" ");

    let cleaned = joined
        .strip_prefix("Description:")
        .unwrap_or(&joined)
        .trim()
        .trim_matches('"')
        .trim()
        .to_string();

    (cleaned.chars().count() >= MIN_DESCRIPTION_CHARS).then_some(cleaned)
}

pub fn fallback_description(module_title: &str, course_title: &str) -> String {
    format!(
        "This module covers important concepts related to {module_title} within the context of \
         {course_title}. Students will explore key principles and practical applications specific \
         to this topic."
    )
}

// Learning outcomes

pub struct OutcomeContext<'a> {
    pub course_title: &'a str,
    pub course_description: &'a str,
    pub module_title: &'a str,
    pub module_description: &'a str,
    pub other_modules: &'a [String],
}

pub fn outcomes_prompt(ctx: &OutcomeContext<'_>) -> String {
    format!(
        "Generate 3-5 specific learning outcomes for this module:\n\n\
         Course: {}\nCourse Description: {}\nModule: {}\nModule Description: {}\nOther Modules: {}\n\n\
         Requirements:\n\
         - Create 3-5 measurable learning outcomes\n\
         - Use action verbs (analyze, evaluate, create, apply, etc.)\n\
         - Be specific to this module only\n\
         - Start each outcome with \"Students will be able to\"\n\n\
         Return ONLY a JSON array of strings:\n[\"Students will be able to ...\", \"Students will be able to ...\"]",
        ctx.course_title,
        ctx.course_description,
        ctx.module_title,
        ctx.module_description,
        ctx.other_modules.join(", "),
    )
}

pub fn parse_outcomes(text: &str) -> Option<Vec<String>> {
    let outcomes = non_blank_strings(parse_json_array::<String>(text)?);
    (3..=5).contains(&outcomes.len()).then_some(outcomes)
}

pub fn fallback_outcomes(module_title: &str) -> Vec<String> {
    vec![
        format!("Students will be able to understand the key concepts of {module_title}"),
        format!("Students will be able to apply principles learned in {module_title}"),
        format!("Students will be able to analyze scenarios related to {module_title}"),
    ]
}

// Sections

pub fn section_prompts(course_title: &str, module_title: &str, module_description: &str) -> Vec<String> {
    vec![
        format!(
            "Create a comprehensive topic outline for self-study learning:\n\n\
             Course: {course_title}\nModule: {module_title}\nDescription: {module_description}\n\n\
             Generate 5-6 essential topics that students must master to fully understand this module. \
             Structure them as a logical learning progression:\n\n\
             1. Foundation topic (basic concepts, definitions)\n\
             2. Core theory topics (2-3 main concepts)\n\
             3. Application topic (practical examples, real-world use)\n\
             4. Advanced topic (complex applications, analysis)\n\n\
             Each topic should be a distinct unit that students can study on their own.\n\n\
             Return ONLY a JSON array of topic titles:\n\
             [\"Foundation Topic Name\", \"Core Concept 1\", \"Core Concept 2\", \"Practical Applications\", \"Advanced Analysis\"]"
        ),
        format!(
            "Break down this module into essential learning topics:\n\n\
             Module: {module_title}\nCourse: {course_title}\n\n\
             Create 5 topics that cover everything needed for complete understanding:\n\
             1. Introduction and basic concepts\n2. Main theoretical framework\n\
             3. Key principles and methods\n4. Real-world examples and cases\n\
             5. Applications and implications\n\n\
             Format as a simple JSON array of topic names:\n[\"Topic 1\", \"Topic 2\", \"Topic 3\", \"Topic 4\", \"Topic 5\"]\n\n\
             Return only the JSON array, no other text."
        ),
        format!(
            "Generate 5 specific section titles for this module:\n\n\
             Module: {module_title}\nCourse: {course_title}\n\n\
             Each title must name a concrete topic of {module_title}, not a generic label.\n\n\
             Return ONLY a JSON array of 5 strings."
        ),
    ]
}

pub fn parse_section_titles(text: &str) -> Option<Vec<String>> {
    let titles = non_blank_strings(parse_json_array::<String>(text)?);
    (4..=7).contains(&titles.len()).then_some(titles)
}

pub fn fallback_section_titles(module_title: &str) -> Vec<String> {
    vec![
        format!("Foundations of {module_title}"),
        "Core Concepts and Principles".to_string(),
        "Theoretical Framework and Methods".to_string(),
        "Practical Applications and Examples".to_string(),
        "Advanced Topics and Analysis".to_string(),
        "Real-World Implementation".to_string(),
    ]
}

// Section content

pub struct SectionContext<'a> {
    pub course_title: &'a str,
    pub module_title: &'a str,
    pub section_title: &'a str,
    pub other_sections: &'a [String],
}

const HTML_RULES: &str = "Formatting Instructions (HTML only):\n\
    - Use <h4> for subsection headings\n\
    - Use <p> for paragraphs\n\
    - Use <ul><li> for bullet points\n\
    - Use <strong> for emphasis\n\
    - For single-line code: <code>example</code>\n\
    - For multi-line code blocks: <pre><code>line 1\nline 2</code></pre>\n\n\
    Return ONLY the HTML-formatted content. Do NOT include any prefixes or commentary outside the HTML.";

pub fn section_content_prompts(ctx: &SectionContext<'_>) -> Vec<String> {
    let others = ctx
        .other_sections
        .iter()
        .map(|title| format!("- {title}"))
        .collect::<Vec<_>>()
        .join("\n");

    vec![
        format!(
            "You are an expert educational content creator. Generate comprehensive, fully \
             self-contained content for the following section:\n\n\
             Course: {}\nModule: {}\nSection: {}\n\n\
             Other sections in this module (to avoid overlap):\n{}\n\n\
             Instructional Requirements:\n\
             - Teach this section in detail, as a self-guided textbook chapter would.\n\
             - Assume learners have no prior knowledge and explain every concept step by step.\n\
             - Provide several fully worked examples specific to \"{}\".\n\
             - Focus only on \"{}\" without overlapping the other sections.\n\
             - Aim for 4-5 substantial paragraphs organized into subsections.\n\n{}",
            ctx.course_title,
            ctx.module_title,
            ctx.section_title,
            others,
            ctx.section_title,
            ctx.section_title,
            HTML_RULES,
        ),
        format!(
            "You are an expert instructional designer. Write a complete lesson on \"{}\" for the \
             {} course (module: {}).\n\n\
             Do not cover these topics, they have their own sections:\n{}\n\n\
             Cover:\n\
             1. What {} is and why it matters\n\
             2. The key ideas, each explained with an example\n\
             3. Common mistakes and how to avoid them\n\
             4. A short summary of the main points\n\n{}",
            ctx.section_title,
            ctx.course_title,
            ctx.module_title,
            others,
            ctx.section_title,
            HTML_RULES,
        ),
    ]
}

pub fn clean_section_content(text: &str) -> Option<String> {
    let cleaned = fix_code_blocks(&strip_known_prefixes(text));
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

pub fn templated_section_content(section_title: &str, course_title: &str) -> String {
    format!(
        "<p>This section covers the essential concepts of {section_title} in the context of \
         {course_title}. Students will develop a working understanding of the topic and learn how \
         to apply it in practice.</p>\n\
         <h4>Key Learning Areas</h4>\n\
         <ul>\n\
         <li>Fundamental principles of {section_title}</li>\n\
         <li>Practical applications and examples</li>\n\
         <li>Common challenges and how to address them</li>\n\
         <li>Connections to other topics in {course_title}</li>\n\
         </ul>"
    )
}

pub fn overview_section_content(section_title: &str) -> String {
    format!(
        "<h4>Overview</h4>\n<p>This section covers <strong>{section_title}</strong> in detail. \
         Work through the concepts and examples below, then review the key points before moving on.</p>"
    )
}

// Activities

pub fn activity_prompts(
    kind: ActivityKind,
    module_title: &str,
    course_title: &str,
    outcomes: &[String],
) -> Vec<String> {
    let goals = if outcomes.is_empty() {
        "- Apply the concepts of this module".to_string()
    } else {
        outcomes
            .iter()
            .map(|o| format!("- {o}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    match kind {
        ActivityKind::Practical => vec![
            format!(
                "Create a practical assignment for {module_title} students.\n\n\
                 Requirements:\n\
                 - Professional scenario using {module_title} concepts\n\
                 - 500-800 word deliverable\n\
                 - Clear instructions\n\n\
                 Module: {module_title}\nCourse: {course_title}\n\n\
                 OUTPUT FORMAT (return only this JSON):\n\
                 {{\"title\": \"Assignment Name\", \"instructions\": \"Complete task description\", \"activity_type\": \"practical\"}}"
            ),
            format!(
                "Create a hands-on practical activity for students studying {module_title}.\n\n\
                 REQUIREMENTS:\n\
                 - Real-world professional scenario\n\
                 - Specific deliverables with a word count\n\
                 - Step-by-step instructions\n\
                 - Uses {module_title} concepts directly\n\n\
                 EXAMPLE:\n\
                 You are an analyst hired by a firm to evaluate three proposals. Using the techniques \
                 from this module, write a report (800-1000 words) that includes: 1) an evaluation of \
                 each proposal 2) a comparison of their risks 3) a recommendation with justification.\n\n\
                 CREATE A SIMILAR ACTIVITY FOR: {module_title}\nCOURSE CONTEXT: {course_title}\n\
                 LEARNING GOALS:\n{goals}\n\n\
                 OUTPUT FORMAT (return exactly this structure):\n\
                 {{\"title\": \"Your Activity Title Here\", \"instructions\": \"Your detailed activity instructions here\", \"activity_type\": \"practical\"}}"
            ),
        ],
        ActivityKind::Analysis => vec![
            format!(
                "Create a workplace decision scenario for {module_title}.\n\n\
                 STRICT FORMAT - Must include:\n\
                 1. Realistic workplace scenario with specific details\n\
                 2. Exactly 4 options (A, B, C, D) with different solutions\n\
                 3. Clear instructions for the student response\n\n\
                 Return ONLY this JSON:\n\
                 {{\"title\": \"Decision Title\", \"instructions\": \"Complete scenario and 4 options here\", \"activity_type\": \"analysis\"}}\n\n\
                 Example structure:\n\
                 \"You are a [job role] at [company]. [Specific situation with numbers/details]. Which action \
                 should you take? A) [solution 1] B) [solution 2] C) [solution 3] D) [solution 4]. Choose the \
                 best option and explain in 200-300 words.\"\n\n\
                 Module: {module_title}\nCourse: {course_title}\n\
                 Make it specific to the {course_title} field."
            ),
            format!(
                "Design a professional scenario assessment for {module_title} students.\n\n\
                 REQUIREMENTS:\n\
                 - Present a business situation requiring {module_title} knowledge\n\
                 - Provide 4 distinct solution choices (A, B, C, D)\n\
                 - Ask students to select the best option and justify their choice\n\n\
                 FORBIDDEN:\n\
                 - Do not reference external materials\n\
                 - Do not create essay questions or open analysis tasks\n\n\
                 JSON OUTPUT REQUIRED:\n\
                 {{\"title\": \"Professional Decision: [Scenario Name]\", \"instructions\": \"[Full scenario with 4 options A-D and response instructions]\", \"activity_type\": \"analysis\"}}\n\n\
                 Context: {course_title} course, {module_title} module\n\
                 Learning objectives:\n{goals}"
            ),
        ],
    }
}

/// Reads `{title, instructions}` from the reply, repairing the JSON or
/// falling back to field extraction. Instructions must beat the minimum
/// length for `kind`.
pub fn parse_activity(text: &str, kind: ActivityKind) -> Option<GeneratedActivity> {
    let json = strip_control_chars(extract_json_object(text)?);

    let activity = parse_lenient::<GeneratedActivity>(&json).or_else(|| {
        Some(GeneratedActivity {
            title: regex_field(&json, "title")?,
            instructions: regex_field(&json, "instructions")?,
        })
    })?;

    let title = activity.title.trim();
    let instructions = activity.instructions.replace("\\n", "\n");
    let instructions = instructions.trim();

    (!title.is_empty() && instructions.chars().count() > kind.min_instructions_len()).then(|| {
        GeneratedActivity {
            title: title.to_string(),
            instructions: instructions.to_string(),
        }
    })
}

pub fn fallback_activity(kind: ActivityKind, module_title: &str, course_title: &str) -> GeneratedActivity {
    match kind {
        ActivityKind::Practical => GeneratedActivity {
            title: format!("Practical Application: {module_title}"),
            instructions: format!(
                "Based on the concepts learned in {module_title}, create a practical example or case \
                 study that demonstrates your understanding. Your response should be 300-500 words and \
                 include specific examples from the module content."
            ),
        },
        ActivityKind::Analysis => GeneratedActivity {
            title: format!("Decision Analysis: {module_title}"),
            instructions: format!(
                "SCENARIO:\n\nYou are a {course_title} professional facing a decision that requires \
                 {module_title} expertise. A client needs immediate recommendations on a complex situation \
                 involving multiple stakeholders and competing priorities.\n\n\
                 OPTIONS:\n\
                 A) Recommend a conservative approach based on established industry standards\n\
                 B) Propose an innovative solution incorporating the latest {module_title} methods\n\
                 C) Suggest gathering additional data before making any recommendations\n\
                 D) Provide multiple options and let the client decide\n\n\
                 TASK:\nChoose the best option (A, B, C, or D) and explain your reasoning in 200-300 words. \
                 Reference specific {module_title} concepts and justify why your chosen option is superior.\n\n\
                 Submit your answer as: 'I choose option [X] because...'"
            ),
        },
    }
}

// Exam items

/// Splits plain text into prompt-sized chunks.
///
/// Short chunks are dropped. When nothing survives, the first chunk is used
/// regardless of length so that every section gets at least one prompt.
pub fn content_chunks(plain: &str) -> Vec<String> {
    let chars: Vec<char> = plain.chars().collect();
    let chunks: Vec<String> = chars
        .chunks(CHUNK_CHARS)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect();

    let useful: Vec<String> = chunks
        .iter()
        .filter(|chunk| chunk.trim().chars().count() > MIN_CHUNK_CHARS)
        .cloned()
        .collect();

    if useful.is_empty() {
        vec![chars.iter().take(CHUNK_CHARS).collect()]
    } else {
        useful
    }
}

pub fn exam_item_prompts(section_title: &str, chunk: &str, difficulty: Difficulty) -> Vec<String> {
    let level = difficulty.as_str();
    let desc = difficulty.description();
    let goal = difficulty.goal();

    vec![
        format!(
            "Topic: {section_title}\nContent: {chunk}\n\nDifficulty: {level}\n\nLevel: {desc}\n\nGoal: {goal}\n\n\
             Create 5 {level} quiz questions in JSON:\n\
             [{{\"question\":\"...\", \"option_a\":\"...\", \"option_b\":\"...\", \"option_c\":\"...\", \"option_d\":\"...\", \"correct_answer\":\"A\"}}]\n\n\
             Make questions appropriate for {level} level."
        ),
        format!(
            "Create 5 {level} level multiple choice questions about: {section_title}\n\n\
             Content chunk: {chunk}\n\nDifficulty: {desc}\n\nInstructions: {goal}\n\n\
             Return ONLY a valid JSON array:\n\
             [{{\"question\":\"What is...?\",\"option_a\":\"Answer A\",\"option_b\":\"Answer B\",\"option_c\":\"Answer C\",\"option_d\":\"Answer D\",\"correct_answer\":\"A\"}}]\n\n\
             Make wrong answers plausible but clearly incorrect."
        ),
        format!(
            "Generate exactly 5 {level}-level questions for \"{section_title}\".\n\n\
             Content: {chunk}\n\nLevel: {desc}\n\nGoal: {goal}\n\n\
             Format as JSON array:\n\
             [{{\"question\": \"Question text?\", \"option_a\": \"Choice A\", \"option_b\": \"Choice B\", \"option_c\": \"Choice C\", \"option_d\": \"Choice D\", \"correct_answer\": \"A\"}}]\n\n\
             Ensure questions match {level} difficulty level."
        ),
    ]
}

/// Complete items from the reply; `None` unless at least three are usable.
pub fn parse_exam_items(text: &str) -> Option<Vec<ItemContent>> {
    let items: Vec<ItemContent> = parse_json_array::<Value>(text)?
        .into_iter()
        .filter_map(|value| serde_json::from_value::<ItemContent>(value).ok())
        .filter_map(ItemContent::normalized)
        .collect();

    (items.len() >= MIN_ITEMS_PER_CHUNK).then_some(items)
}

pub fn fallback_exam_items(difficulty: Difficulty, section_title: &str) -> Vec<ItemContent> {
    (1..=FALLBACK_ITEM_COUNT)
        .map(|i| ItemContent {
            question: format!("{} Question {} about {}?", difficulty.title(), i, section_title),
            option_a: "Option A".to_string(),
            option_b: "Option B".to_string(),
            option_c: "Option C".to_string(),
            option_d: "Option D".to_string(),
            correct_answer: "A".to_string(),
        })
        .collect()
}

// Grading

pub fn grading_prompts(instructions: &str, submission: &str) -> Vec<String> {
    vec![
        format!(
            "You are a teacher grading student work. Write feedback as if you are personally \
             reviewing this submission.\n\n\
             ASSIGNMENT: {instructions}\nSTUDENT WORK: {submission}\n\n\
             Grade 0-100 and write natural teacher feedback. Check for AI usage; if detected, reduce \
             the grade significantly.\n\n\
             Write feedback like a teacher would:\n\
             - Use \"I noticed...\" \"Your work shows...\" \"Good job on...\"\n\
             - Point out specific strengths and weaknesses\n\
             - Give constructive suggestions\n\n\
             Format: {{\"grade\": number, \"feedback\": \"natural teacher feedback\", \"ai_detected\": boolean}}"
        ),
        format!(
            "Grade this like a teacher reviewing homework. Write personal, conversational feedback.\n\n\
             Task: {instructions}\nStudent Answer: {submission}\n\n\
             If this looks AI-generated, reduce the grade and mention it in the feedback.\n\n\
             Return: {{\"grade\": number, \"feedback\": \"conversational teacher feedback\", \"ai_detected\": boolean}}"
        ),
        format!(
            "Grade this student work and write brief teacher comments.\n\n\
             Assignment: {instructions}\nStudent Response: {submission}\n\n\
             Start with an overall impression, then mention what worked and what did not.\n\n\
             Format: {{\"grade\": number, \"feedback\": \"brief teacher comments\", \"ai_detected\": boolean}}"
        ),
    ]
}

/// A grade in `0..=100` with non-empty feedback. Grades sent as strings are
/// accepted.
pub fn parse_grade(text: &str) -> Option<GradeSuggestion> {
    let json = strip_control_chars(extract_json_object(text)?);
    let value: Value = parse_lenient(&json)?;

    let grade = match value.get("grade")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !(0.0..=100.0).contains(&grade) {
        return None;
    }

    let feedback = value.get("feedback")?.as_str()?.trim();
    if feedback.is_empty() {
        return None;
    }

    Some(GradeSuggestion {
        grade,
        feedback: feedback.to_string(),
        ai_detected: value
            .get("ai_detected")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

pub fn fallback_grade() -> GradeSuggestion {
    GradeSuggestion {
        grade: FALLBACK_GRADE,
        feedback: "I reviewed your submission and it appears to meet the basic requirements. \
                   However, I need to do a more thorough review to give you detailed feedback. \
                   Please see me during office hours if you have questions about this grade."
            .to_string(),
        ai_detected: false,
    }
}

fn non_blank_strings(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| collapse_whitespace(&v))
        .filter(|v| !v.is_empty())
        .collect()
}
